use crate::domain::model::{CellValue, ExternalRow};
use crate::utils::error::{ImportError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// xlsx / xlsm / xlsb / xls / ods
    Workbook,
    Csv,
}

/// 讀取試算表第一個工作表，標題列決定欄位名稱
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetReader;

impl SpreadsheetReader {
    pub fn detect_format(path: &str) -> Result<SpreadsheetFormat> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SpreadsheetFormat::Workbook),
            "csv" => Ok(SpreadsheetFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat { extension }),
        }
    }

    pub fn parse(&self, data: &[u8], format: SpreadsheetFormat) -> Result<Vec<ExternalRow>> {
        match format {
            SpreadsheetFormat::Workbook => self.parse_workbook(data),
            SpreadsheetFormat::Csv => self.parse_csv(data),
        }
    }

    pub fn parse_workbook(&self, data: &[u8]) -> Result<Vec<ExternalRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::SpreadsheetError {
                message: "Workbook has no sheets".to_string(),
            })?;
        let range = workbook.worksheet_range(&sheet_name)?;
        tracing::debug!("Using sheet \"{}\" ({:?})", sheet_name, range.get_size());

        let header_row_number = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| ImportError::SpreadsheetError {
                message: format!("Sheet \"{}\" has no header row", sheet_name),
            })?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let mut records = Vec::new();
        for (offset, cells) in rows.enumerate() {
            let mut row = ExternalRow::new(header_row_number + offset + 1);
            for (header, cell) in headers.iter().zip(cells) {
                if !header.is_empty() {
                    row.insert(header, cell_value(cell));
                }
            }

            // 跳過完全空白的列
            if !row.is_blank() {
                records.push(row);
            }
        }

        Ok(records)
    }

    pub fn parse_csv(&self, data: &[u8]) -> Result<Vec<ExternalRow>> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        // 標題保持原樣：映射表的標題可能含尾端空白
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(index + 2);

            let mut row = ExternalRow::new(row_number);
            for (header, value) in headers.iter().zip(record.iter()) {
                if header.is_empty() {
                    continue;
                }
                let cell = if value.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(value.to_string())
                };
                row.insert(header, cell);
            }

            if !row.is_blank() {
                records.push(row);
            }
        }

        Ok(records)
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        other => CellValue::Text(other.to_string()),
    }
}
