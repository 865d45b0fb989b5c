// ==========================================
// 学校管理门户 - 记录提交 Trait
// ==========================================
// 职责: 导入会话与外部持久化之间的唯一接缝
// 约定: 一次提交整批记录；true 表示成功，false / Err 表示失败
// ==========================================

use crate::domain::MappedRecord;
use async_trait::async_trait;
use std::future::Future;

// ==========================================
// RecordSink Trait
// ==========================================
// 实现者: InMemoryRecordSink, SqliteRecordStore, FnRecordSink
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 批量提交映射后的记录
    ///
    /// # 返回
    /// - Ok(true): 持久化成功
    /// - Ok(false): 对端拒绝
    /// - Err: 调用失败（视同拒绝）
    async fn submit(&self, records: &[MappedRecord]) -> anyhow::Result<bool>;
}

// ==========================================
// FnRecordSink - 闭包适配器
// ==========================================
// 将 `async |records| -> anyhow::Result<bool>` 形式的回调包装为 RecordSink
pub struct FnRecordSink<F> {
    callback: F,
}

impl<F> FnRecordSink<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F, Fut> RecordSink for FnRecordSink<F>
where
    F: Fn(Vec<MappedRecord>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send,
{
    async fn submit(&self, records: &[MappedRecord]) -> anyhow::Result<bool> {
        (self.callback)(records.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_sink_forwards_batch() {
        let sink = FnRecordSink::new(|records: Vec<MappedRecord>| async move {
            Ok::<bool, anyhow::Error>(records.len() == 2)
        });

        let batch = vec![MappedRecord::new(), MappedRecord::new()];
        assert!(sink.submit(&batch).await.unwrap());
        assert!(!sink.submit(&batch[..1]).await.unwrap());
    }
}
