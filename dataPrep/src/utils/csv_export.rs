use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Local;
use csv::Writer;
use tracing::info;
use crate::config::constants::LABEL_COL;
use crate::models::table::Table;
use crate::utils::error::PrepResult;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Writes `table` as CSV with the row label first, followed by the union
/// of all columns in first-seen order. Missing cells are left empty.
pub fn write_table<W: Write>(table: &Table, writer: W) -> PrepResult<()> {
    let columns = table.column_names();
    let mut wtr = Writer::from_writer(writer);

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push(LABEL_COL.to_string());
    header.extend(columns.iter().cloned());
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.label.clone());
        for column in &columns {
            record.push(row.get(column).map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Output location for prepared tables
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    /// With `timestamped` the files go into a fresh `%Y%m%d_%H%M%S` subfolder.
    pub fn new(output_dir: impl AsRef<Path>, timestamped: bool) -> PrepResult<Self> {
        let mut full_path = output_dir.as_ref().to_path_buf();
        if timestamped {
            full_path = full_path.join(Local::now().format("%Y%m%d_%H%M%S").to_string());
        }
        fs::create_dir_all(&full_path)?;
        Ok(Self { output_dir: full_path })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn export_table(&self, file_name: &str, table: &Table) -> PrepResult<PathBuf> {
        let _timing = logging::start_timing("export_table", OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join(file_name);
        let file = File::create(&path)?;
        write_table(table, file)?;
        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(path)
    }
}
