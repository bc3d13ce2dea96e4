//! Approximate centroids of Indian states and union territories.
//!
//! The distribution view places each state's value at its centroid instead
//! of drawing boundary polygons.

/// `(name, longitude, latitude)` in degrees.
const STATE_CENTROIDS: &[(&str, f64, f64)] = &[
    ("Andaman and Nicobar Islands", 92.66, 11.62),
    ("Andhra Pradesh", 79.74, 15.91),
    ("Arunachal Pradesh", 94.73, 28.22),
    ("Assam", 92.94, 26.20),
    ("Bihar", 85.31, 25.10),
    ("Chandigarh", 76.78, 30.73),
    ("Chhattisgarh", 81.87, 21.28),
    ("Dadra and Nagar Haveli", 73.02, 20.18),
    ("Daman and Diu", 72.84, 20.43),
    ("Delhi", 77.10, 28.70),
    ("Goa", 74.12, 15.30),
    ("Gujarat", 71.19, 22.26),
    ("Haryana", 76.09, 29.06),
    ("Himachal Pradesh", 77.17, 31.10),
    ("Jammu and Kashmir", 74.80, 33.78),
    ("Jharkhand", 85.28, 23.61),
    ("Karnataka", 75.71, 15.32),
    ("Kerala", 76.27, 10.85),
    ("Ladakh", 77.58, 34.15),
    ("Madhya Pradesh", 78.66, 22.97),
    ("Maharashtra", 75.71, 19.75),
    ("Manipur", 93.91, 24.66),
    ("Meghalaya", 91.37, 25.47),
    ("Mizoram", 92.94, 23.16),
    ("Nagaland", 94.56, 26.16),
    ("Odisha", 85.10, 20.95),
    ("Puducherry", 79.81, 11.94),
    ("Punjab", 75.34, 31.15),
    ("Rajasthan", 74.22, 27.02),
    ("Sikkim", 88.51, 27.53),
    ("Tamil Nadu", 78.66, 11.13),
    ("Telangana", 79.02, 18.11),
    ("Tripura", 91.99, 23.94),
    ("Uttar Pradesh", 80.95, 26.85),
    ("Uttarakhand", 79.02, 30.07),
    ("West Bengal", 87.85, 22.99),
];

/// Lower-case, `&` spelled out, runs of whitespace collapsed.
fn normalise(name: &str) -> String {
    name.replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `(longitude, latitude)` of a state, if known.
pub fn centroid(state: &str) -> Option<(f64, f64)> {
    let key = normalise(state);
    let key = match key.as_str() {
        "orissa" => "odisha".to_string(),
        "nct of delhi" => "delhi".to_string(),
        "pondicherry" => "puducherry".to_string(),
        _ => key,
    };
    STATE_CENTROIDS
        .iter()
        .find(|(name, _, _)| normalise(name) == key)
        .map(|&(_, lon, lat)| (lon, lat))
}
