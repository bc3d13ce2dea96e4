use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Dataset, Season, TrendDataset, TrendRecord, YieldRecord};
use crate::error::{Result, YieldError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the main crop-yield table.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – columnar file written by Pandas or Polars
/// * `.csv` / `.txt`    – comma-separated with a header row
/// * `.tsv`             – tab-separated with a header row
///
/// Required columns: State, District, Crop, Year (or Crop_Year), Season,
/// Area, Production, Yield.  Header matching ignores case, spaces and
/// underscores, so `"Yield "` and `"Crop_Year"` are accepted.
pub fn load(path: &Path) -> Result<Dataset> {
    let table = read_table(path)?;
    let columns = table.locate(path, &Column::FULL)?;

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = RowCells { path, row_no: i + 1, row, columns: &columns };
            let season_text = cells.text(Column::Season)?;
            let season = season_text
                .parse::<Season>()
                .map_err(|e| cells.error(Column::Season, &e))?;
            Ok(YieldRecord {
                state: cells.text(Column::State)?,
                district: cells.text(Column::District)?,
                year: cells.year(Column::Year)?,
                season,
                crop: cells.text(Column::Crop)?,
                area: cells.number(Column::Area)?,
                production: cells.number(Column::Production)?,
                yield_value: cells.number(Column::Yield)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let dataset = Dataset::from_records(records).map_err(|msg| {
        log::warn!("Rejected {}: {msg}", path.display());
        YieldError::data_format(path, msg)
    })?;
    log::info!(
        "Loaded {} yield records ({} states, {} crops) from {}",
        dataset.len(),
        dataset.states().count(),
        dataset.crops().count(),
        path.display()
    );
    Ok(dataset)
}

/// Load the long historical table used for trend charts.
///
/// Only Crop, Year and Yield are required; a State column is kept when present.
pub fn load_trends(path: &Path) -> Result<TrendDataset> {
    let table = read_table(path)?;
    let columns = table.locate(path, &Column::TREND)?;
    let state_idx = table.position(Column::State);

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = RowCells { path, row_no: i + 1, row, columns: &columns };
            Ok(TrendRecord {
                crop: cells.text(Column::Crop)?,
                year: cells.year(Column::Year)?,
                yield_value: cells.number(Column::Yield)?,
                state: state_idx.and_then(|idx| row.get(idx)).and_then(Cell::as_text),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let dataset = TrendDataset::from_records(records);
    log::info!(
        "Loaded {} trend records ({} crops) from {}",
        dataset.len(),
        dataset.crops().count(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    State,
    District,
    Crop,
    Year,
    Season,
    Area,
    Production,
    Yield,
}

impl Column {
    const FULL: [Column; 8] = [
        Column::State,
        Column::District,
        Column::Crop,
        Column::Year,
        Column::Season,
        Column::Area,
        Column::Production,
        Column::Yield,
    ];

    const TREND: [Column; 3] = [Column::Crop, Column::Year, Column::Yield];

    fn label(self) -> &'static str {
        match self {
            Column::State => "State",
            Column::District => "District",
            Column::Crop => "Crop",
            Column::Year => "Year",
            Column::Season => "Season",
            Column::Area => "Area",
            Column::Production => "Production",
            Column::Yield => "Yield",
        }
    }

    /// Normalised header spellings that map onto this column.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::State => &["state", "statename"],
            Column::District => &["district", "districtname"],
            Column::Crop => &["crop"],
            Column::Year => &["year", "cropyear"],
            Column::Season => &["season"],
            Column::Area => &["area"],
            Column::Production => &["production"],
            Column::Yield => &["yield"],
        }
    }
}

fn normalise_header(h: &str) -> String {
    h.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Resolved column positions, in the order of the requested column list.
struct ColumnIndex {
    entries: Vec<(Column, usize)>,
}

impl ColumnIndex {
    fn get(&self, column: Column) -> usize {
        self.entries
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, idx)| *idx)
            .unwrap_or(usize::MAX)
    }
}

// ---------------------------------------------------------------------------
// Intermediate table: header + loosely typed cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Null,
}

impl Cell {
    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(_) | Cell::Null => None,
        }
    }

    fn as_year(&self) -> Option<i32> {
        match self {
            Cell::Int(i) => i32::try_from(*i).ok(),
            Cell::Float(f)
                if f.is_finite()
                    && f.fract() == 0.0
                    && (i32::MIN as f64..=i32::MAX as f64).contains(f) =>
            {
                Some(*f as i32)
            }
            Cell::Text(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Cell::Text(s) => format!("'{s}'"),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Null => "<null>".to_string(),
        }
    }
}

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    fn position(&self, column: Column) -> Option<usize> {
        let aliases = column.aliases();
        self.headers
            .iter()
            .position(|h| aliases.contains(&normalise_header(h).as_str()))
    }

    /// Resolve every requested column or fail listing the missing ones.
    fn locate(&self, path: &Path, wanted: &[Column]) -> Result<ColumnIndex> {
        let mut entries = Vec::with_capacity(wanted.len());
        let mut missing = Vec::new();
        for &col in wanted {
            match self.position(col) {
                Some(idx) => entries.push((col, idx)),
                None => missing.push(col.label()),
            }
        }
        if !missing.is_empty() {
            log::warn!(
                "{} is missing required columns {missing:?} (found {:?})",
                path.display(),
                self.headers
            );
            return Err(YieldError::data_format(
                path,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }
        Ok(ColumnIndex { entries })
    }
}

/// Typed accessors over one row, producing row/column-qualified errors.
struct RowCells<'a> {
    path: &'a Path,
    row_no: usize,
    row: &'a [Cell],
    columns: &'a ColumnIndex,
}

impl RowCells<'_> {
    fn cell(&self, column: Column) -> &Cell {
        self.row.get(self.columns.get(column)).unwrap_or(&Cell::Null)
    }

    fn error(&self, column: Column, message: &str) -> YieldError {
        YieldError::data_format(
            self.path,
            format!("row {}, column '{}': {message}", self.row_no, column.label()),
        )
    }

    fn text(&self, column: Column) -> Result<String> {
        let cell = self.cell(column);
        cell.as_text()
            .ok_or_else(|| self.error(column, &format!("{} is not a text value", cell.describe())))
    }

    fn year(&self, column: Column) -> Result<i32> {
        let cell = self.cell(column);
        cell.as_year()
            .ok_or_else(|| self.error(column, &format!("{} is not a year", cell.describe())))
    }

    fn number(&self, column: Column) -> Result<f64> {
        let cell = self.cell(column);
        cell.as_number()
            .ok_or_else(|| self.error(column, &format!("{} is not a number", cell.describe())))
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| {
        log::warn!("Cannot open {}: {source}", path.display());
        YieldError::DataNotFound {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn read_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => read_parquet(path),
        "csv" | "txt" => read_delimited(path, b','),
        "tsv" => read_delimited(path, b'\t'),
        other => {
            // Surface a missing file as such, even with an odd extension.
            open(path)?;
            Err(YieldError::data_format(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Delimited text reader
// ---------------------------------------------------------------------------

/// Header row plus one cell per field; every cell is kept as text and typed
/// later by [`RowCells`].
fn read_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| YieldError::data_format(path, format!("reading header row: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| YieldError::data_format(path, format!("row {}: {e}", row_no + 1)))?;
        rows.push(
            record
                .iter()
                .map(|s| {
                    if s.trim().is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(s.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read every record batch of a Parquet file into cells.
///
/// Strings may be Utf8, LargeUtf8 or dictionary encoded (Pandas
/// categoricals); numbers any of the common integer / float widths.
fn read_parquet(path: &Path) -> Result<Table> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| YieldError::data_format(path, format!("reading parquet metadata: {e}")))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| YieldError::data_format(path, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| YieldError::data_format(path, format!("reading record batch: {e}")))?;

        let columns = batch
            .columns()
            .iter()
            .map(|col| match col.data_type() {
                DataType::Dictionary(_, _) => cast(col, &DataType::Utf8).map_err(|e| {
                    YieldError::data_format(path, format!("decoding dictionary column: {e}"))
                }),
                _ => Ok(Arc::clone(col)),
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .zip(&headers)
                .map(|(col, name)| {
                    extract_cell(col, row).map_err(|msg| {
                        YieldError::data_format(
                            path,
                            format!("row {}, column '{name}': {msg}", rows.len() + 1),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(Table { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> std::result::Result<Cell, String> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| Cell::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| Cell::Text(a.value(row).to_string())),
        DataType::Int16 => any
            .downcast_ref::<Int16Array>()
            .map(|a| Cell::Int(a.value(row) as i64)),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Cell::Int(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Cell::Int(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| Cell::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| Cell::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Cell::Text(a.value(row).to_string())),
        other => return Err(format!("unsupported column type {other:?}")),
    };
    cell.ok_or_else(|| format!("column does not match its declared type {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::{Builder, NamedTempFile};

    use crate::data::filter::districts_for_state;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    const HEADER: &str = "State,District,Crop,Year,Season,Area,Production,Yield\n";

    #[test]
    fn loads_typed_records_from_csv() {
        let file = csv_file(&format!(
            "{HEADER}X,A,Wheat,2020,Kharif,10,50,5.0\nX,B,Wheat,2020,Kharif,20,80,4.0\n"
        ));
        let ds = load(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.district, "A");
        assert_eq!(first.season, Season::Kharif);
        assert_eq!(first.year, 2020);
        assert_eq!(first.production, 50.0);
        assert_eq!(districts_for_state(&ds, "X"), ["A", "B"]);
    }

    #[test]
    fn accepts_raw_export_headers() {
        let file = csv_file(
            "State,District ,Crop,Crop_Year,Season,Area ,Production,Yield \n\
             Bihar,Patna,Rice,2019,Whole Year ,1200,2400,2.0\n",
        );
        let ds = load(file.path()).unwrap();
        assert_eq!(ds.records()[0].season, Season::WholeYear);
        assert_eq!(ds.records()[0].year, 2019);
    }

    #[test]
    fn missing_yield_column_is_a_format_error() {
        let file = csv_file(
            "State,District,Crop,Year,Season,Area,Production\nX,A,Wheat,2020,Kharif,10,50\n",
        );
        match load(file.path()) {
            Err(YieldError::DataFormat { message, .. }) => assert!(message.contains("Yield")),
            other => panic!("expected DataFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_data_not_found() {
        let err = load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, YieldError::DataNotFound { .. }));
    }

    #[test]
    fn bad_cells_name_row_and_column() {
        let file = csv_file(&format!("{HEADER}X,A,Wheat,2020,Kharif,ten,50,5.0\n"));
        let err = load(file.path()).unwrap_err().to_string();
        assert!(err.contains("row 1"), "{err}");
        assert!(err.contains("'Area'"), "{err}");

        let file = csv_file(&format!("{HEADER}X,A,Wheat,2020,Monsoon,10,50,5.0\n"));
        assert!(matches!(load(file.path()), Err(YieldError::DataFormat { .. })));
    }

    #[test]
    fn shared_district_names_load_under_each_state() {
        let file = csv_file(&format!(
            "{HEADER}Bihar,Aurangabad,Rice,2020,Kharif,10,20,2.0\n\
             Maharashtra,Aurangabad,Rice,2020,Kharif,10,30,3.0\n"
        ));
        let ds = load(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(districts_for_state(&ds, "Bihar"), ["Aurangabad"]);
        assert_eq!(districts_for_state(&ds, "Maharashtra"), ["Aurangabad"]);
    }

    #[test]
    fn float_years_must_fit_an_i32() {
        assert_eq!(Cell::Float(2020.0).as_year(), Some(2020));
        assert_eq!(Cell::Float(2020.5).as_year(), None);
        assert_eq!(Cell::Float(1e12).as_year(), None);
        assert_eq!(Cell::Float(-1e12).as_year(), None);
        assert_eq!(Cell::Float(f64::NAN).as_year(), None);
    }

    #[test]
    fn negative_production_is_rejected_at_load() {
        let file = csv_file(&format!("{HEADER}X,A,Wheat,2020,Kharif,10,-5,5.0\n"));
        assert!(matches!(load(file.path()), Err(YieldError::DataFormat { .. })));
    }

    #[test]
    fn trends_need_only_crop_year_yield() {
        let file = csv_file("Crop,Year,Yield\nWheat,2005,2.6\nRice,2005,2.1\nWheat,2006,2.7\n");
        let trends = load_trends(file.path()).unwrap();
        assert_eq!(trends.len(), 3);
        assert_eq!(trends.crops().collect::<Vec<_>>(), ["Rice", "Wheat"]);
        assert!(trends.records()[0].state.is_none());

        let file = csv_file("Crop,Yield\nWheat,2.6\n");
        assert!(matches!(load_trends(file.path()), Err(YieldError::DataFormat { .. })));
    }

    #[test]
    fn loads_parquet_with_integer_years() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, false),
            Field::new("District", DataType::Utf8, false),
            Field::new("Crop", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, false),
            Field::new("Season", DataType::Utf8, false),
            Field::new("Area", DataType::Float64, false),
            Field::new("Production", DataType::Float64, false),
            Field::new("Yield", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["X", "X"])),
                Arc::new(StringArray::from(vec!["B", "A"])),
                Arc::new(StringArray::from(vec!["Wheat", "Wheat"])),
                Arc::new(Int64Array::from(vec![2020, 2020])),
                Arc::new(StringArray::from(vec!["Rabi", "Rabi"])),
                Arc::new(Float64Array::from(vec![20.0, 10.0])),
                Arc::new(Float64Array::from(vec![80.0, 50.0])),
                Arc::new(Float64Array::from(vec![4.0, 5.0])),
            ],
        )
        .unwrap();

        let file = Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[1].yield_value, 5.0);
        assert_eq!(districts_for_state(&ds, "X"), ["A", "B"]);
    }

    #[test]
    fn unsupported_extension_is_a_format_error() {
        let mut file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(file, "not a table").unwrap();
        assert!(matches!(load(file.path()), Err(YieldError::DataFormat { .. })));
    }
}
