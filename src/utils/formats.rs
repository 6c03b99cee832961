//! 按扩展名解码词表文件：txt/csv 走行文本解析，xlsx 读第一个工作表

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::model::data_core::AppError;
use crate::model::pair::ParseResult;
use crate::model::parser::{Cell, PairParser};
use crate::model::tree::extension_of;

/// 读取 xlsx 第一个工作表的已用区域
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, AppError> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| AppError::Sheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Sheet("工作簿中没有工作表".into()))?
        .map_err(|e| AppError::Sheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_of).collect())
        .collect())
}

fn cell_of(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

/// 按文件名扩展名选择解析方式
pub fn parse_file_bytes(
    parser: &PairParser,
    file_name: &str,
    bytes: &[u8],
) -> Result<ParseResult, AppError> {
    match extension_of(file_name).as_deref() {
        Some("txt") | Some("csv") => {
            let text = String::from_utf8_lossy(bytes);
            Ok(parser.parse_text(&text)?)
        }
        Some("xlsx") => {
            let rows = read_first_sheet(bytes)?;
            Ok(parser.parse_tabular(&rows)?)
        }
        other => Err(AppError::UnsupportedFormat(other.unwrap_or_default().to_string())),
    }
}
