use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crop_yield::data::{Season, YieldRecord};
use crop_yield::predict::model::LinearModel;
use crop_yield::predict::YieldModel;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

const STATES: &[(&str, &[&str])] = &[
    ("Bihar", &["Gaya", "Patna", "Purnia"]),
    ("Karnataka", &["Belagavi", "Mandya", "Mysuru"]),
    ("Madhya Pradesh", &["Indore", "Sagar", "Ujjain"]),
    ("Punjab", &["Amritsar", "Bathinda", "Ludhiana"]),
    ("Uttar Pradesh", &["Agra", "Bareilly", "Meerut"]),
    ("West Bengal", &["Bardhaman", "Hooghly", "Nadia"]),
];

/// Crop, its usual season and a base yield in tonnes / hectare.
const CROPS: &[(&str, Season, f64)] = &[
    ("Bajra", Season::Kharif, 1.4),
    ("Gram", Season::Rabi, 1.1),
    ("Groundnut", Season::Kharif, 1.6),
    ("Maize", Season::Kharif, 2.9),
    ("Potato", Season::Rabi, 22.0),
    ("Rice", Season::Kharif, 2.6),
    ("Sugarcane", Season::WholeYear, 78.0),
    ("Wheat", Season::Rabi, 3.4),
];

fn complete_dataset(rng: &mut SimpleRng) -> Vec<YieldRecord> {
    let mut records = Vec::new();
    for (si, &(state, districts)) in STATES.iter().enumerate() {
        let state_factor = 0.8 + 0.08 * si as f64;
        for &district in districts {
            let district_factor = rng.uniform(0.9, 1.1);
            for &(crop, season, base) in CROPS {
                for year in 2018..=2021 {
                    let trend = 1.0 + 0.015 * (year - 2018) as f64;
                    let yield_value =
                        base * state_factor * district_factor * trend * rng.uniform(0.92, 1.08);
                    let area = rng.uniform(500.0, 40_000.0).round();
                    records.push(YieldRecord {
                        state: state.to_string(),
                        district: district.to_string(),
                        year,
                        season,
                        crop: crop.to_string(),
                        area,
                        production: (area * yield_value).round(),
                        yield_value,
                    });
                }
            }
        }
    }
    records
}

fn write_csv(path: &Path, records: &[YieldRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "State", "District", "Crop", "Year", "Season", "Area", "Production", "Yield",
    ])?;
    for r in records {
        writer.write_record([
            r.state.clone(),
            r.district.clone(),
            r.crop.clone(),
            r.year.to_string(),
            r.season.to_string(),
            r.area.to_string(),
            r.production.to_string(),
            format!("{:.4}", r.yield_value),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, records: &[YieldRecord]) -> Result<()> {
    let text = |f: fn(&YieldRecord) -> String| {
        StringArray::from(records.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("State", DataType::Utf8, false),
        Field::new("District", DataType::Utf8, false),
        Field::new("Crop", DataType::Utf8, false),
        Field::new("Year", DataType::Int32, false),
        Field::new("Season", DataType::Utf8, false),
        Field::new("Area", DataType::Float64, false),
        Field::new("Production", DataType::Float64, false),
        Field::new("Yield", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|r| r.state.clone())),
            Arc::new(text(|r| r.district.clone())),
            Arc::new(text(|r| r.crop.clone())),
            Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
            Arc::new(text(|r| r.season.to_string())),
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.area))),
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.production))),
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.yield_value))),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

/// National yearly yields, 2005-2021, one row per crop and state.
fn write_history(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).context("creating history CSV")?;
    writer.write_record(["Crop", "Year", "State", "Yield"])?;
    let mut rows = 0;
    for &(crop, _, base) in CROPS {
        for year in 2005..=2021 {
            let trend = 0.8 + 0.015 * (year - 2005) as f64;
            for &(state, _) in STATES {
                let value = base * trend * rng.uniform(0.85, 1.15);
                writer.write_record([crop, &year.to_string(), state, &format!("{value:.4}")])?;
                rows += 1;
            }
        }
    }
    writer.flush()?;
    Ok(rows)
}

fn sample_model() -> YieldModel {
    YieldModel::Linear(LinearModel {
        intercept: 0.0,
        coefficients: BTreeMap::from([
            ("productivity".to_string(), 0.85),
            ("hist_district_season_yield".to_string(), 0.15),
        ]),
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir).context("creating data directory")?;

    let mut rng = SimpleRng::new(42);
    let records = complete_dataset(&mut rng);

    write_csv(&out_dir.join("CompleteDataset.csv"), &records)?;
    write_parquet(&out_dir.join("CompleteDataset.parquet"), &records)?;
    let history_rows = write_history(&out_dir.join("FinalDataSet(2005-2021).csv"), &mut rng)?;

    let model_file = File::create(out_dir.join("model.json")).context("creating model file")?;
    serde_json::to_writer_pretty(model_file, &sample_model()).context("writing model")?;

    println!(
        "Wrote {} yield records, {history_rows} history rows and a model to {}",
        records.len(),
        out_dir.display()
    );
    Ok(())
}
