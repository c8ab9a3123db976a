use std::fs::File;
use std::io::Read;
use std::path::Path;
use csv::ReaderBuilder;
use tracing::info;
use crate::models::table::{Row, Table, Value};
use crate::utils::error::{PrepError, PrepResult};
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Parses comma separated text into a table.
///
/// When `index_col` is given its cell becomes the row label and is not kept
/// as a cell; otherwise rows are labelled by position.
pub fn parse_table(contents: &str, index_col: Option<&str>) -> PrepResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let index_pos = match index_col {
        Some(name) => Some(
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PrepError::LookupFailure(format!("index column '{}'", name)))?,
        ),
        None => None,
    };

    let mut table = Table::new();
    for (position, result) in reader.records().enumerate() {
        let record = result?;
        let label = match index_pos {
            Some(i) => record
                .get(i)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .ok_or_else(|| PrepError::LookupFailure(format!("index value in line {}", position + 2)))?,
            None => position.to_string(),
        };

        let mut row = Row::new(label);
        for (i, (header, raw)) in headers.iter().zip(record.iter()).enumerate() {
            if Some(i) == index_pos {
                continue;
            }
            if let Some(value) = Value::parse(raw) {
                row.set(header, value);
            }
        }
        table.push(row);
    }
    Ok(table)
}

pub fn load_table(csv_path: impl AsRef<Path>, index_col: Option<&str>) -> PrepResult<Table> {
    let _timing = logging::start_timing("load_table", OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    let mut file = File::open(csv_path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let table = parse_table(&contents, index_col)?;
    info!("Loaded {} rows from {}", table.len(), csv_path.as_ref().display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cells_and_index() {
        let csv = "label,from,type,capacity,efficiency_el\n\
                   pp1,DE_bus_lignite,ipp,800,0.38\n\
                   pp2,DE_bus_natgas,chp,120.5,\n";
        let table = parse_table(csv, Some("label")).unwrap();
        assert_eq!(table.len(), 2);

        let pp1 = table.find("pp1").unwrap();
        assert_eq!(pp1.number("capacity").unwrap(), 800.0);
        assert_eq!(pp1.text("type").unwrap(), "ipp");
        assert!(pp1.get("label").is_none());

        let pp2 = table.find("pp2").unwrap();
        assert!(pp2.get("efficiency_el").is_none());
    }

    #[test]
    fn positional_labels_without_index() {
        let table = parse_table("year,capacity\n2025,1500\n2026,1800\n", None).unwrap();
        assert_eq!(table.rows[1].label, "1");
        assert_eq!(table.rows[1].number("year").unwrap(), 2026.0);
    }

    #[test]
    fn unknown_index_column() {
        assert!(matches!(parse_table("a,b\n1,2\n", Some("label")), Err(PrepError::LookupFailure(_))));
    }
}
