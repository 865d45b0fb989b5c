// ==========================================
// 学校管理门户 - 单元格清洗器
// ==========================================
// 职责: 单元格 → 字符串值 / Excel 序列日期 → dd/mm/yyyy
// ==========================================

use crate::domain::{CellValue, ValueKind};
use chrono::DateTime;

/// Excel 纪元（1899-12-30）与 Unix 纪元之间的天数
pub const EXCEL_UNIX_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const MS_PER_DAY: f64 = 86_400.0 * 1_000.0;

/// 输出日期格式
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

pub struct DataCleaner;

impl DataCleaner {
    /// Excel 序列日期 → dd/mm/yyyy（UTC）
    ///
    /// 超出可表示范围时返回 None
    pub fn serial_to_date_string(&self, serial: f64) -> Option<String> {
        if !serial.is_finite() {
            return None;
        }
        let millis = ((serial - EXCEL_UNIX_EPOCH_OFFSET_DAYS) * MS_PER_DAY).trunc();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
            .map(|dt| dt.format(DATE_DISPLAY_FORMAT).to_string())
    }

    /// 按字段值类型将单元格解析为输出字符串
    ///
    /// - Date 字段且单元格为数值: 按序列日期转换
    /// - 其余: 单元格显示文本（已 TRIM）
    pub fn resolve_cell(&self, value_kind: ValueKind, cell: &CellValue) -> String {
        match (value_kind, cell) {
            (ValueKind::Date, CellValue::Number(serial)) => self
                .serial_to_date_string(*serial)
                .unwrap_or_else(|| cell.to_string()),
            _ => cell.to_string(),
        }
    }

    /// 标准化空白（空字符串/空白 → None）
    pub fn normalize_blank(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
