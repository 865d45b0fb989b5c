// ==========================================
// 学校管理门户 - 内存记录仓储
// ==========================================
// 用途: 每个实例独立的内存存储，替代进程级全局模拟数据
// ==========================================

use crate::domain::MappedRecord;
use crate::repository::record_sink::RecordSink;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkBehavior {
    Accept,
    Reject,
    Fail,
}

pub struct InMemoryRecordSink {
    behavior: SinkBehavior,
    batches: Mutex<Vec<Vec<MappedRecord>>>,
    calls: Mutex<usize>,
}

impl Default for InMemoryRecordSink {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordSink {
    /// 接受所有提交
    pub fn new() -> Self {
        Self::with_behavior(SinkBehavior::Accept)
    }

    /// 所有提交返回 false
    pub fn rejecting() -> Self {
        Self::with_behavior(SinkBehavior::Reject)
    }

    /// 所有提交返回 Err
    pub fn failing() -> Self {
        Self::with_behavior(SinkBehavior::Fail)
    }

    fn with_behavior(behavior: SinkBehavior) -> Self {
        Self {
            behavior,
            batches: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        }
    }

    /// 已接受的批次
    pub fn batches(&self) -> Vec<Vec<MappedRecord>> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// 已接受的记录总数
    pub fn record_count(&self) -> usize {
        self.batches().iter().map(Vec::len).sum()
    }

    /// submit 被调用的次数（含被拒绝的调用）
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn submit(&self, records: &[MappedRecord]) -> anyhow::Result<bool> {
        {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?;
            *calls += 1;
        }

        match self.behavior {
            SinkBehavior::Accept => {
                let mut batches = self
                    .batches
                    .lock()
                    .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?;
                batches.push(records.to_vec());
                Ok(true)
            }
            SinkBehavior::Reject => Ok(false),
            SinkBehavior::Fail => Err(anyhow::anyhow!("批量创建接口不可用")),
        }
    }
}
