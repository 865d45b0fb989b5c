// ==========================================
// 学校管理门户 - 字段映射领域模型
// ==========================================
// 职责: 调用方声明的目标字段（FieldMapping）、
//       用户确认的列分配（ColumnAssignment）、
//       最终输出记录（MappedRecord）
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 字段来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Column,    // 从映射列读取
    SheetName, // 取所在工作表名称（如课程代码）
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Column => write!(f, "COLUMN"),
            SourceKind::SheetName => write!(f, "SHEET_NAME"),
        }
    }
}

// ==========================================
// 字段值类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Date,
    Number,
}

// ==========================================
// FieldMapping - 目标字段声明
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub source_kind: SourceKind,
    #[serde(rename = "dataType", default)]
    pub value_kind: ValueKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldMapping {
    /// 列字段（从表格列读取）
    pub fn column(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            source_kind: SourceKind::Column,
            value_kind: ValueKind::String,
            required: false,
        }
    }

    /// 工作表名称字段
    pub fn sheet_name(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            source_kind: SourceKind::SheetName,
            value_kind: ValueKind::String,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    pub fn is_column(&self) -> bool {
        self.source_kind == SourceKind::Column
    }

    /// 必填列字段（决定提交拦截与行保留）
    pub fn is_required_column(&self) -> bool {
        self.required && self.is_column()
    }
}

// ==========================================
// ColumnAssignment - 字段 → 表头
// ==========================================
// 不做跨字段唯一性校验：两个字段可以指向同一表头
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    entries: BTreeMap<String, String>,
}

impl ColumnAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配表头（覆盖原值）；空表头视为取消分配
    pub fn assign(&mut self, field_key: impl Into<String>, header: impl Into<String>) {
        let field_key = field_key.into();
        let header = header.into();
        if header.trim().is_empty() {
            self.entries.remove(&field_key);
        } else {
            self.entries.insert(field_key, header);
        }
    }

    pub fn get(&self, field_key: &str) -> Option<&str> {
        self.entries.get(field_key).map(String::as_str)
    }

    pub fn is_mapped(&self, field_key: &str) -> bool {
        self.get(field_key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ==========================================
// MappedRecord - 输出记录
// ==========================================
// 保持字段声明顺序；序列化为 JSON 对象
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappedRecord {
    entries: IndexMap<String, String>,
}

impl MappedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段值；同名字段覆盖（保留原位置）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
