// ==========================================
// 学校管理门户 - 导入会话（映射向导状态机）
// ==========================================
// 状态: NoFile → FileLoaded → Submitting → Success
//       提交失败时回到 FileLoaded（保留工作簿与映射）
// 取消: close() 递增会话纪元；纪元不一致的提交结果被丢弃
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ColumnAssignment, FieldMapping, MappedRecord, Workbook};
use crate::i18n::t_with_args;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::ExcelWorkbookParser;
use crate::importer::header_matcher::KeywordHeaderMatcher;
use crate::importer::import_mapper_trait::{HeaderMatcher, RecordFlattener, WorkbookParser};
use crate::repository::RecordSink;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 会话状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoFile,     // 未选择文件
    FileLoaded, // 映射可编辑
    Submitting, // 提交中，禁止交互
    Success,    // 提交成功，等待自动关闭
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NoFile => write!(f, "NO_FILE"),
            SessionState::FileLoaded => write!(f, "FILE_LOADED"),
            SessionState::Submitting => write!(f, "SUBMITTING"),
            SessionState::Success => write!(f, "SUCCESS"),
        }
    }
}

// ==========================================
// 提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 持久化成功；close_after 后会话应自动关闭
    Succeeded {
        record_count: usize,
        close_after: Duration,
    },
    /// 会话已关闭，迟到的结果被忽略
    Discarded,
}

impl SubmitOutcome {
    /// 成功提示文本（按当前语言渲染）；被丢弃的结果无提示
    pub fn user_message(&self) -> Option<String> {
        match self {
            SubmitOutcome::Succeeded { record_count, .. } => Some(t_with_args(
                "import.success",
                &[("count", record_count.to_string().as_str())],
            )),
            SubmitOutcome::Discarded => None,
        }
    }
}

/// 已进入 Submitting 状态、尚未执行的提交
pub struct PendingSubmission {
    epoch: u64,
    records: Vec<MappedRecord>,
    sink: Arc<dyn RecordSink>,
}

impl PendingSubmission {
    pub fn records(&self) -> &[MappedRecord] {
        &self.records
    }

    /// 调用外部持久化回调（整批一次）
    pub async fn settle(self) -> SubmissionSettlement {
        let result = self.sink.submit(&self.records).await;
        SubmissionSettlement {
            epoch: self.epoch,
            record_count: self.records.len(),
            result,
        }
    }
}

/// 回调已返回的提交
pub struct SubmissionSettlement {
    epoch: u64,
    record_count: usize,
    result: anyhow::Result<bool>,
}

// ==========================================
// ImportSession
// ==========================================
pub struct ImportSession {
    fields: Vec<FieldMapping>,
    sink: Arc<dyn RecordSink>,
    settings: ImportSettings,

    // 导入组件
    parser: Box<dyn WorkbookParser>,
    matcher: Box<dyn HeaderMatcher>,
    flattener: Box<dyn RecordFlattener>,

    // 会话局部状态
    state: SessionState,
    workbook: Option<Workbook>,
    file_name: Option<String>,
    assignment: ColumnAssignment,
    last_error: Option<String>,
    epoch: u64,
}

impl ImportSession {
    /// 使用默认组件与默认配置创建会话
    ///
    /// # 参数
    /// - fields: 调用方声明的目标字段
    /// - sink: 提交回调
    pub fn new(fields: Vec<FieldMapping>, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_settings(fields, sink, ImportSettings::default())
    }

    pub fn with_settings(
        fields: Vec<FieldMapping>,
        sink: Arc<dyn RecordSink>,
        settings: ImportSettings,
    ) -> Self {
        let parser = ExcelWorkbookParser::with_extensions(settings.accepted_extensions.clone());
        Self::with_components(
            fields,
            sink,
            settings,
            Box::new(parser),
            Box::new(KeywordHeaderMatcher),
            Box::new(FieldMapper),
        )
    }

    pub fn with_components(
        fields: Vec<FieldMapping>,
        sink: Arc<dyn RecordSink>,
        settings: ImportSettings,
        parser: Box<dyn WorkbookParser>,
        matcher: Box<dyn HeaderMatcher>,
        flattener: Box<dyn RecordFlattener>,
    ) -> Self {
        Self {
            fields,
            sink,
            settings,
            parser,
            matcher,
            flattener,
            state: SessionState::NoFile,
            workbook: None,
            file_name: None,
            assignment: ColumnAssignment::new(),
            last_error: None,
            epoch: 0,
        }
    }

    // ===== 查询 =====

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn assignment(&self) -> &ColumnAssignment {
        &self.assignment
    }

    /// 映射界面可选的表头（规范工作表）
    pub fn headers(&self) -> &[String] {
        self.workbook
            .as_ref()
            .map(Workbook::canonical_headers)
            .unwrap_or(&[])
    }

    /// 最近一次错误的用户提示
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 尚未映射的必填列字段
    pub fn unmapped_required(&self) -> Vec<&FieldMapping> {
        self.fields
            .iter()
            .filter(|f| f.is_required_column() && !self.assignment.is_mapped(&f.key))
            .collect()
    }

    // ===== 文件加载 =====

    /// 加载内存中的文件并自动映射表头
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn load_bytes(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ImportResult<&ColumnAssignment> {
        self.ensure_state("load", &[SessionState::NoFile, SessionState::FileLoaded])?;

        match self.parser.parse_bytes(file_name, bytes) {
            Ok(workbook) => {
                self.apply_workbook(file_name, workbook);
                Ok(&self.assignment)
            }
            Err(e) => {
                warn!(file_name = %file_name, error = %e, "文件加载失败");
                self.reset();
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// 读取磁盘文件并加载
    #[instrument(skip(self, file_path))]
    pub async fn load_file<P: AsRef<Path>>(
        &mut self,
        file_path: P,
    ) -> ImportResult<&ColumnAssignment> {
        self.ensure_state("load", &[SessionState::NoFile, SessionState::FileLoaded])?;

        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = if e.kind() == std::io::ErrorKind::NotFound {
                    ImportError::FileNotFound(path.display().to_string())
                } else {
                    ImportError::from(e)
                };
                warn!(path = %path.display(), error = %err, "文件读取失败");
                self.reset();
                self.last_error = Some(err.user_message());
                return Err(err);
            }
        };

        self.load_bytes(&file_name, bytes)
    }

    fn apply_workbook(&mut self, file_name: &str, workbook: Workbook) {
        let assignment = self.matcher.suggest(&self.fields, workbook.canonical_headers());
        info!(
            file_name = %file_name,
            sheets = workbook.sheets.len(),
            rows = workbook.total_rows(),
            auto_mapped = assignment.len(),
            "文件加载完成"
        );

        self.workbook = Some(workbook);
        self.file_name = Some(file_name.to_string());
        self.assignment = assignment;
        self.last_error = None;
        self.state = SessionState::FileLoaded;
    }

    // ===== 映射编辑 =====

    /// 为字段选择表头（覆盖原选择；空表头即取消）
    pub fn assign_column(&mut self, field_key: &str, header: &str) -> ImportResult<()> {
        self.ensure_state("assign_column", &[SessionState::FileLoaded])?;

        if !self.fields.iter().any(|f| f.is_column() && f.key == field_key) {
            return Err(ImportError::UnknownField(field_key.to_string()));
        }

        debug!(field = %field_key, header = %header, "手动调整列映射");
        self.assignment.assign(field_key, header);
        Ok(())
    }

    /// 取消字段映射
    pub fn clear_column(&mut self, field_key: &str) -> ImportResult<()> {
        self.assign_column(field_key, "")
    }

    /// 预览展开结果（不提交）
    pub fn preview(&self) -> ImportResult<Vec<MappedRecord>> {
        self.ensure_state("preview", &[SessionState::FileLoaded])?;
        let workbook = self.loaded_workbook()?;
        self.flattener.flatten(workbook, &self.fields, &self.assignment)
    }

    // ===== 提交 =====

    /// 校验并展开记录，进入 Submitting
    ///
    /// 必填字段未映射时保持 FileLoaded 并返回 MissingMapping，回调不会被调用
    #[instrument(skip(self))]
    pub fn begin_submit(&mut self) -> ImportResult<PendingSubmission> {
        self.ensure_state("submit", &[SessionState::FileLoaded])?;

        let workbook = self.loaded_workbook()?;
        let records = match self.flattener.flatten(workbook, &self.fields, &self.assignment) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "提交前校验失败");
                self.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        info!(records = records.len(), epoch = self.epoch, "开始提交");
        self.state = SessionState::Submitting;
        self.last_error = None;

        Ok(PendingSubmission {
            epoch: self.epoch,
            records,
            sink: Arc::clone(&self.sink),
        })
    }

    /// 应用已返回的提交结果
    pub fn complete_submit(
        &mut self,
        settlement: SubmissionSettlement,
    ) -> ImportResult<SubmitOutcome> {
        if settlement.epoch != self.epoch || self.state != SessionState::Submitting {
            debug!(
                settled_epoch = settlement.epoch,
                current_epoch = self.epoch,
                "会话已关闭，忽略迟到的提交结果"
            );
            return Ok(SubmitOutcome::Discarded);
        }

        let reason = match settlement.result {
            Ok(true) => {
                info!(records = settlement.record_count, "提交成功");
                self.state = SessionState::Success;
                self.workbook = None;
                return Ok(SubmitOutcome::Succeeded {
                    record_count: settlement.record_count,
                    close_after: self.settings.success_close_delay,
                });
            }
            Ok(false) => "提交回调返回失败".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(reason = %reason, "提交被拒绝，保留映射以便重试");
        let err = ImportError::SubmitRejected(reason);
        self.state = SessionState::FileLoaded;
        self.last_error = Some(err.user_message());
        Err(err)
    }

    /// 校验 → 整批提交 → 应用结果
    pub async fn submit(&mut self) -> ImportResult<SubmitOutcome> {
        let pending = self.begin_submit()?;
        let settlement = pending.settle().await;
        self.complete_submit(settlement)
    }

    /// 成功后等待配置的延迟再关闭会话
    ///
    /// 等待期间持有会话独占借用；需要提前关闭的调用方应自行计时并调用 close()
    pub async fn auto_close(&mut self) {
        if self.state != SessionState::Success {
            return;
        }
        tokio::time::sleep(self.settings.success_close_delay).await;
        self.close();
    }

    // ===== 关闭 =====

    /// 关闭/取消：清空全部局部状态，进行中的提交结果将被忽略
    pub fn close(&mut self) {
        debug!(state = %self.state, "关闭导入会话");
        self.reset();
        self.epoch += 1;
    }

    fn reset(&mut self) {
        self.state = SessionState::NoFile;
        self.workbook = None;
        self.file_name = None;
        self.assignment = ColumnAssignment::new();
        self.last_error = None;
    }

    fn loaded_workbook(&self) -> ImportResult<&Workbook> {
        self.workbook.as_ref().ok_or_else(|| ImportError::InvalidState {
            action: "flatten".to_string(),
            state: self.state.to_string(),
        })
    }

    fn ensure_state(&self, action: &str, allowed: &[SessionState]) -> ImportResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ImportError::InvalidState {
                action: action.to_string(),
                state: self.state.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, Sheet};
    use crate::repository::InMemoryRecordSink;

    // 直接注入工作簿，绕过文件解析
    struct FixedParser(Workbook);

    impl WorkbookParser for FixedParser {
        fn parse_bytes(&self, _file_name: &str, _bytes: Vec<u8>) -> ImportResult<Workbook> {
            Ok(self.0.clone())
        }

        fn parse_file(&self, _file_path: &Path) -> ImportResult<Workbook> {
            Ok(self.0.clone())
        }
    }

    fn workbook() -> Workbook {
        let grid: Vec<Vec<CellValue>> = vec![
            vec!["Nom".into(), "Prenom".into(), "Email".into()],
            vec!["Dupont".into(), "Marie".into(), "m@x.com".into()],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
        ];
        Workbook::new(vec![Sheet::from_grid("CURR_X", grid).unwrap()]).unwrap()
    }

    fn fields() -> Vec<FieldMapping> {
        vec![
            FieldMapping::sheet_name("curriculum_code", "Code cursus").required(),
            FieldMapping::column("last_name", "Nom").required(),
            FieldMapping::column("first_name", "Prénom").required(),
            FieldMapping::column("email", "Email"),
        ]
    }

    fn session(sink: Arc<InMemoryRecordSink>) -> ImportSession {
        let settings = ImportSettings {
            success_close_delay: Duration::from_millis(10),
            ..ImportSettings::default()
        };
        ImportSession::with_components(
            fields(),
            sink,
            settings,
            Box::new(FixedParser(workbook())),
            Box::new(KeywordHeaderMatcher),
            Box::new(FieldMapper),
        )
    }

    #[test]
    fn test_load_seeds_assignment() {
        let mut session = session(Arc::new(InMemoryRecordSink::new()));
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();

        assert_eq!(session.state(), SessionState::FileLoaded);
        assert_eq!(session.assignment().get("last_name"), Some("Nom"));
        assert_eq!(session.assignment().get("first_name"), Some("Prenom"));
        assert_eq!(session.headers().len(), 3);
        assert!(session.unmapped_required().is_empty());
    }

    #[test]
    fn test_assignment_only_editable_when_loaded() {
        let mut session = session(Arc::new(InMemoryRecordSink::new()));
        let result = session.assign_column("email", "Email");
        assert!(matches!(result, Err(ImportError::InvalidState { .. })));

        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();
        session.assign_column("email", "Nom").unwrap();
        assert_eq!(session.assignment().get("email"), Some("Nom"));

        // SHEET_NAME 字段不可分配列
        let result = session.assign_column("curriculum_code", "Nom");
        assert!(matches!(result, Err(ImportError::UnknownField(_))));
    }

    #[tokio::test]
    async fn test_submit_success_then_auto_close() {
        let sink = Arc::new(InMemoryRecordSink::new());
        let mut session = session(sink.clone());
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();

        let outcome = session.submit().await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Succeeded {
                record_count: 1,
                close_after: Duration::from_millis(10),
            }
        );
        assert_eq!(session.state(), SessionState::Success);
        assert!(session.workbook().is_none());
        assert_eq!(sink.record_count(), 1);

        session.auto_close().await;
        assert_eq!(session.state(), SessionState::NoFile);
    }

    #[tokio::test]
    async fn test_missing_mapping_blocks_submit() {
        let sink = Arc::new(InMemoryRecordSink::new());
        let mut session = session(sink.clone());
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();
        session.clear_column("first_name").unwrap();

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, ImportError::MissingMapping { ref labels } if labels == &["Prénom"]));
        assert_eq!(session.state(), SessionState::FileLoaded);
        assert!(session.last_error().is_some());
        assert_eq!(sink.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_mapping_for_retry() {
        let sink = Arc::new(InMemoryRecordSink::rejecting());
        let mut session = session(sink.clone());
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();
        session.assign_column("email", "Email").unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, ImportError::SubmitRejected(_)));
        assert_eq!(session.state(), SessionState::FileLoaded);
        assert!(session.workbook().is_some());
        assert_eq!(session.assignment().get("email"), Some("Email"));

        // 无需重新上传即可重试
        assert!(session.submit().await.is_err());
        assert_eq!(sink.call_count(), 2);
    }

    #[tokio::test]
    async fn test_settlement_after_close_is_discarded() {
        let sink = Arc::new(InMemoryRecordSink::new());
        let mut session = session(sink.clone());
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();

        let pending = session.begin_submit().unwrap();
        assert_eq!(session.state(), SessionState::Submitting);
        assert!(matches!(
            session.begin_submit(),
            Err(ImportError::InvalidState { .. })
        ));

        session.close();
        let settlement = pending.settle().await;
        let outcome = session.complete_submit(settlement).unwrap();

        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(session.state(), SessionState::NoFile);
        assert!(session.assignment().is_empty());
    }

    #[test]
    fn test_load_rejected_while_submitting() {
        let mut session = session(Arc::new(InMemoryRecordSink::new()));
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();
        let _pending = session.begin_submit().unwrap();

        let result = session.load_bytes("autre.xlsx", Vec::new());

        assert!(matches!(
            result,
            Err(ImportError::InvalidState { ref action, ref state })
                if action == "load" && state == "SUBMITTING"
        ));
        assert_eq!(session.state(), SessionState::Submitting);
        assert_eq!(session.file_name(), Some("eleves.xlsx"));
    }

    #[test]
    fn test_success_message_is_localized() {
        let _guard = crate::i18n::tests::LOCALE_TEST_LOCK.lock().unwrap();
        crate::i18n::set_locale("en");
        let outcome = SubmitOutcome::Succeeded {
            record_count: 3,
            close_after: Duration::from_millis(10),
        };

        assert_eq!(
            outcome.user_message().as_deref(),
            Some("3 record(s) imported successfully")
        );
        assert_eq!(SubmitOutcome::Discarded.user_message(), None);
        crate::i18n::set_locale("fr");
    }

    #[test]
    fn test_close_resets_everything() {
        let mut session = session(Arc::new(InMemoryRecordSink::new()));
        session.load_bytes("eleves.xlsx", Vec::new()).unwrap();

        session.close();

        assert_eq!(session.state(), SessionState::NoFile);
        assert!(session.workbook().is_none());
        assert!(session.file_name().is_none());
        assert!(session.assignment().is_empty());
        assert!(session.headers().is_empty());
    }
}
