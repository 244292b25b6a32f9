use crate::domain::model::{Cell, Row, Table};
use crate::domain::ports::TableStore;
use crate::utils::error::{PipelineError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Tables stored as CSV files: one record per row, cells typed on load.
#[derive(Debug, Clone, Default)]
pub struct CsvTableStore;

impl CsvTableStore {
    pub fn new() -> Self {
        Self
    }
}

pub fn parse_cell(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    match field.trim().parse::<f64>() {
        // NaN 不算數字；inf / -inf 要能讀回 format_cell 寫出的值
        Ok(value) if !value.is_nan() => Cell::Number(value),
        _ => Cell::Text(field.to_string()),
    }
}

pub fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number(value) => value.to_string(),
        Cell::Text(value) => value.clone(),
    }
}

pub fn decode_table(path: &str, bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut table = Table::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::SourceCorrupt {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let cells = record.iter().map(parse_cell).collect();
        table.rows.push(Row::new(index, cells));
    }
    Ok(table)
}

pub fn encode_table(path: &str, table: &Table) -> Result<Vec<u8>> {
    let write_failure = |message: String| PipelineError::OutputWriteFailure {
        path: path.to_string(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in &table.rows {
        let mut fields: Vec<String> = row.cells.iter().map(format_cell).collect();
        // 空列仍要佔一行，否則後面的列號會錯位
        if fields.is_empty() {
            fields.push(String::new());
        }
        writer
            .write_record(&fields)
            .map_err(|e| write_failure(e.to_string()))?;
    }

    writer.into_inner().map_err(|e| write_failure(e.to_string()))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

impl TableStore for CsvTableStore {
    async fn load(&self, path: &str) -> Result<Table> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::SourceNotFound {
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(PipelineError::IoError(e)),
        };
        decode_table(path, &bytes)
    }

    async fn save(&self, path: &str, table: &Table) -> Result<()> {
        let data = encode_table(path, table)?;
        let write_failure = |e: std::io::Error| PipelineError::OutputWriteFailure {
            path: path.to_string(),
            message: e.to_string(),
        };

        let target = Path::new(path);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_failure)?;
        }

        // 先寫暫存檔再 rename，避免半寫入的輸出檔
        let temp = temp_path_for(target);
        tokio::fs::write(&temp, &data).await.map_err(write_failure)?;
        if let Err(e) = tokio::fs::rename(&temp, target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_failure(e));
        }

        tracing::debug!("Wrote {} rows ({} bytes) to {}", table.len(), data.len(), path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}
