// ==========================================
// 学校管理门户 - 工作簿解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls)，读取全部工作表
// ==========================================

use crate::domain::{CellValue, Sheet, Workbook};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_mapper_trait::WorkbookParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

/// 默认接受的扩展名
pub const DEFAULT_EXTENSIONS: &[&str] = &["xlsx", "xls"];

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelWorkbookParser {
    accepted_extensions: Vec<String>,
}

impl Default for ExcelWorkbookParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelWorkbookParser {
    pub fn new() -> Self {
        Self {
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// 使用配置中的扩展名列表
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            accepted_extensions: extensions
                .into_iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// 校验扩展名
    fn check_extension(&self, file_name: &str) -> ImportResult<()> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if self.accepted_extensions.iter().any(|accepted| *accepted == ext) {
            Ok(())
        } else {
            Err(ImportError::UnsupportedFormat(ext))
        }
    }

    /// 读取所有工作表
    fn read_sheets<RS: Read + Seek + Clone>(&self, reader: RS) -> ImportResult<Workbook> {
        let mut workbook = open_workbook_auto_from_rs(reader)?;
        let sheet_names = workbook.sheet_names();
        debug!(sheets = sheet_names.len(), "工作簿打开成功");

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            let grid: Vec<Vec<CellValue>> = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();

            match Sheet::from_grid(name.clone(), grid) {
                Some(sheet) => {
                    debug!(sheet = %name, rows = sheet.rows.len(), "工作表解析完成");
                    sheets.push(sheet);
                }
                None => debug!(sheet = %name, "工作表无表头行，跳过"),
            }
        }

        let workbook = Workbook::new(sheets).ok_or(ImportError::NoDataFound)?;
        info!(
            sheets = workbook.sheets.len(),
            total_rows = workbook.total_rows(),
            canonical_sheet = %workbook.canonical_sheet().name,
            "工作簿解析完成"
        );
        Ok(workbook)
    }
}

impl WorkbookParser for ExcelWorkbookParser {
    fn parse_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportResult<Workbook> {
        self.check_extension(file_name)?;
        self.read_sheets(Cursor::new(bytes))
    }

    fn parse_file(&self, file_path: &Path) -> ImportResult<Workbook> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        self.check_extension(file_name)?;

        let bytes = std::fs::read(file_path)?;
        self.read_sheets(Cursor::new(bytes))
    }
}

/// calamine 单元格 → CellValue
///
/// 日期格式单元格渲染为 dd/mm/yyyy 文本；其余保持原始值
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match DataCleaner.serial_to_date_string(serial) {
                Some(text) => CellValue::Text(text),
                None => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}
