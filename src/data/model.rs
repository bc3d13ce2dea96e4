use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Season – the cropping period of a record
// ---------------------------------------------------------------------------

/// The six agricultural seasons found in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Autumn,
    Kharif,
    Rabi,
    Summer,
    WholeYear,
    Winter,
}

impl Season {
    pub const ALL: [Season; 6] = [
        Season::Autumn,
        Season::Kharif,
        Season::Rabi,
        Season::Summer,
        Season::WholeYear,
        Season::Winter,
    ];

    /// Identifier used in feature names (`season_<ident>`).
    pub fn ident(self) -> &'static str {
        match self {
            Season::Autumn => "Autumn",
            Season::Kharif => "Kharif",
            Season::Rabi => "Rabi",
            Season::Summer => "Summer",
            Season::WholeYear => "WholeYear",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::WholeYear => write!(f, "Whole Year"),
            other => write!(f, "{}", other.ident()),
        }
    }
}

impl FromStr for Season {
    type Err = String;

    /// Accepts the padded, mixed-case labels of the raw CSV exports
    /// (`"Kharif     "`, `"Whole Year "`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "autumn" => Ok(Season::Autumn),
            "kharif" => Ok(Season::Kharif),
            "rabi" => Ok(Season::Rabi),
            "summer" => Ok(Season::Summer),
            "wholeyear" => Ok(Season::WholeYear),
            "winter" => Ok(Season::Winter),
            _ => Err(format!("unknown season '{}'", s.trim())),
        }
    }
}

// ---------------------------------------------------------------------------
// CropYear – the minimal view shared by both record kinds
// ---------------------------------------------------------------------------

/// Anything that carries a crop name, a year and a yield observation.
pub trait CropYear {
    fn crop(&self) -> &str;
    fn year(&self) -> i32;
    fn yield_value(&self) -> f64;
}

// ---------------------------------------------------------------------------
// YieldRecord – one row of the main dataset
// ---------------------------------------------------------------------------

/// A single district-level observation.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRecord {
    pub state: String,
    pub district: String,
    pub year: i32,
    pub season: Season,
    pub crop: String,
    /// Hectares, never negative.
    pub area: f64,
    /// Tonnes, never negative.
    pub production: f64,
    pub yield_value: f64,
}

impl CropYear for YieldRecord {
    fn crop(&self) -> &str {
        &self.crop
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn yield_value(&self) -> f64 {
        self.yield_value
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The parsed dataset with pre-computed selector indices.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<YieldRecord>,
    states: BTreeSet<String>,
    crops: BTreeSet<String>,
}

impl Dataset {
    /// Build indices after checking the table invariants.
    ///
    /// Fails when a record has a negative or non-finite area / production.
    /// District names are only unique within a state (Aurangabad exists in
    /// both Bihar and Maharashtra), so districts are always paired with their
    /// state.
    pub fn from_records(records: Vec<YieldRecord>) -> Result<Self, String> {
        for (i, rec) in records.iter().enumerate() {
            if !(rec.area.is_finite() && rec.area >= 0.0) {
                return Err(format!("record {i}: area {} is not a non-negative number", rec.area));
            }
            if !(rec.production.is_finite() && rec.production >= 0.0) {
                return Err(format!(
                    "record {i}: production {} is not a non-negative number",
                    rec.production
                ));
            }
        }

        let states = records.iter().map(|r| r.state.clone()).collect();
        let crops = records.iter().map(|r| r.crop.clone()).collect();
        Ok(Dataset {
            records,
            states,
            crops,
        })
    }

    pub fn records(&self) -> &[YieldRecord] {
        &self.records
    }

    /// Distinct states, sorted ascending.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }

    /// Distinct crops, sorted ascending.
    pub fn crops(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(String::as_str)
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TrendRecord / TrendDataset – the long historical series
// ---------------------------------------------------------------------------

/// One row of the multi-decade history file. Only crop, year and yield are
/// required there.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRecord {
    pub crop: String,
    pub year: i32,
    pub yield_value: f64,
    pub state: Option<String>,
}

impl CropYear for TrendRecord {
    fn crop(&self) -> &str {
        &self.crop
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn yield_value(&self) -> f64 {
        self.yield_value
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendDataset {
    records: Vec<TrendRecord>,
    crops: BTreeSet<String>,
}

impl TrendDataset {
    pub fn from_records(records: Vec<TrendRecord>) -> Self {
        let crops = records.iter().map(|r| r.crop.clone()).collect();
        TrendDataset { records, crops }
    }

    pub fn records(&self) -> &[TrendRecord] {
        &self.records
    }

    pub fn crops(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
