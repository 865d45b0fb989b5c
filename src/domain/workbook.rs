// ==========================================
// 学校管理门户 - 工作簿领域模型
// ==========================================
// 职责: 上传文件解析后的内存表示（Workbook / Sheet / CellValue）
// 生命周期: 仅存在于一次导入会话内，关闭或提交成功即丢弃
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
// 日期格式单元格在解析阶段已渲染为 dd/mm/yyyy 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// 是否为空白（空单元格或仅含空白字符的文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }

    /// 数值单元格返回其数值（用于序列日期识别）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s.trim()),
            // 整数值不带 ".0" 后缀
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// ==========================================
// Sheet - 工作表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// 由原始网格构建工作表
    ///
    /// 第 0 行为表头；其余行为数据行，完全空白的行被丢弃。
    /// 网格为空时返回 None（该工作表没有表头行）。
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<CellValue>>) -> Option<Self> {
        let mut rows = grid.into_iter();
        let header_row = rows.next()?;

        let headers = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .collect();

        Some(Self {
            name: name.into(),
            headers,
            rows,
        })
    }

    /// 查找表头所在列（精确匹配）
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }
}

// ==========================================
// Workbook - 工作簿
// ==========================================
// 仅支持序列化：canonical_index 由 Workbook::new 保证有效
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// 提供映射表头的工作表下标
    canonical_index: usize,
}

impl Workbook {
    /// 由已解析的工作表构建工作簿
    ///
    /// 规范表头取自第一个含数据行的工作表。
    /// 所有工作表均无数据行时返回 None；仅有表头的工作表仍被保留。
    pub fn new(sheets: Vec<Sheet>) -> Option<Self> {
        let canonical_index = sheets.iter().position(Sheet::has_data)?;

        Some(Self {
            sheets,
            canonical_index,
        })
    }

    /// 映射界面使用的表头（假设所有工作表结构一致）
    pub fn canonical_headers(&self) -> &[String] {
        &self.sheets[self.canonical_index].headers
    }

    pub fn canonical_sheet(&self) -> &Sheet {
        &self.sheets[self.canonical_index]
    }

    /// 所有工作表的数据行总数
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_sheet_from_grid_drops_blank_rows() {
        let grid = vec![
            vec![text("Nom"), text("Email")],
            vec![text("Dupont"), text("d@x.com")],
            vec![CellValue::Empty, text("   ")],
            vec![text("Martin"), CellValue::Empty],
        ];

        let sheet = Sheet::from_grid("L1", grid).unwrap();

        assert_eq!(sheet.headers, vec!["Nom", "Email"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.column_index("Email"), Some(1));
        assert_eq!(sheet.column_index("Téléphone"), None);
    }

    #[test]
    fn test_sheet_from_empty_grid() {
        assert!(Sheet::from_grid("vide", Vec::new()).is_none());
    }

    #[test]
    fn test_canonical_sheet_is_first_with_data() {
        let empty = Sheet::from_grid("A", vec![vec![text("X")]]).unwrap();
        let filled = Sheet::from_grid(
            "B",
            vec![vec![text("Nom")], vec![text("Dupont")]],
        )
        .unwrap();

        let workbook = Workbook::new(vec![empty, filled]).unwrap();

        assert_eq!(workbook.canonical_sheet().name, "B");
        assert_eq!(workbook.canonical_headers(), ["Nom".to_string()]);
        assert_eq!(workbook.total_rows(), 1);
    }

    #[test]
    fn test_workbook_without_data_rows_is_rejected() {
        let header_only = Sheet::from_grid("CURR_X", vec![vec![text("Nom")]]).unwrap();
        assert!(Workbook::new(vec![header_only]).is_none());
        assert!(Workbook::new(Vec::new()).is_none());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Text("  a  ".to_string()).to_string(), "a");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
