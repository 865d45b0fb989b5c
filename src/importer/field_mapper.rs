// ==========================================
// 学校管理门户 - 字段映射器实现
// ==========================================
// 阶段 2: 工作簿 + 列分配 → MappedRecord 列表
// 职责: 必填映射校验 + 逐行展开 + 日期标准化 + 空行过滤
// ==========================================

use crate::domain::{
    CellValue, ColumnAssignment, FieldMapping, MappedRecord, Sheet, SourceKind, Workbook,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_mapper_trait::RecordFlattener;
use tracing::{debug, info};

pub struct FieldMapper;

impl RecordFlattener for FieldMapper {
    fn validate_assignment(
        &self,
        fields: &[FieldMapping],
        assignment: &ColumnAssignment,
    ) -> ImportResult<()> {
        let labels: Vec<String> = fields
            .iter()
            .filter(|f| f.is_required_column() && !assignment.is_mapped(&f.key))
            .map(|f| f.label.clone())
            .collect();

        if labels.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingMapping { labels })
        }
    }

    fn flatten(
        &self,
        workbook: &Workbook,
        fields: &[FieldMapping],
        assignment: &ColumnAssignment,
    ) -> ImportResult<Vec<MappedRecord>> {
        self.validate_assignment(fields, assignment)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for sheet in &workbook.sheets {
            let columns = self.resolve_columns(sheet, fields, assignment);

            for row in &sheet.rows {
                match self.map_row(sheet, row, fields, &columns) {
                    Some(record) => records.push(record),
                    None => dropped += 1,
                }
            }
            debug!(sheet = %sheet.name, rows = sheet.rows.len(), "工作表展开完成");
        }

        info!(records = records.len(), dropped = dropped, "记录展开完成");
        Ok(records)
    }
}

impl FieldMapper {
    /// 计算每个字段在当前工作表中的列下标
    ///
    /// 表头以各自工作表为准；找不到时为 None（值取空字符串）
    fn resolve_columns(
        &self,
        sheet: &Sheet,
        fields: &[FieldMapping],
        assignment: &ColumnAssignment,
    ) -> Vec<Option<usize>> {
        fields
            .iter()
            .map(|field| match field.source_kind {
                SourceKind::Column => assignment
                    .get(&field.key)
                    .and_then(|header| sheet.column_index(header)),
                SourceKind::SheetName => None,
            })
            .collect()
    }

    /// 映射单行；所有必填列字段均为空白时返回 None
    fn map_row(
        &self,
        sheet: &Sheet,
        row: &[CellValue],
        fields: &[FieldMapping],
        columns: &[Option<usize>],
    ) -> Option<MappedRecord> {
        let cleaner = DataCleaner;
        let mut record = MappedRecord::new();
        let mut has_required_value = false;

        for (field, column) in fields.iter().zip(columns) {
            let value = match field.source_kind {
                SourceKind::SheetName => sheet.name.clone(),
                SourceKind::Column => column
                    .and_then(|idx| row.get(idx))
                    .map(|cell| cleaner.resolve_cell(field.value_kind, cell))
                    .unwrap_or_default(),
            };

            if field.is_required_column() && cleaner.normalize_blank(&value).is_some() {
                has_required_value = true;
            }
            record.insert(field.key.clone(), value);
        }

        has_required_value.then_some(record)
    }
}
