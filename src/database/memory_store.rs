use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::OtpStore;
use crate::error::AppResult;
use crate::models::OtpRecord;

/// 进程内存储，用于测试和无数据库的本地开发
#[derive(Clone, Default)]
pub struct MemoryOtpStore {
    records: Arc<RwLock<Vec<OtpRecord>>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn records_for(&self, phone: &str) -> Vec<OtpRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.phone == phone)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn delete_by_phone(&self, phone: &str) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.phone != phone);
        Ok((before - records.len()) as u64)
    }

    async fn insert(&self, record: OtpRecord) -> AppResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn find_latest(&self, phone: &str) -> AppResult<Option<OtpRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.phone == phone)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok((before - records.len()) as u64)
    }

    async fn increment_attempts(&self, id: Uuid) -> AppResult<Option<i32>> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|r| r.id == id).map(|r| {
            r.attempts += 1;
            r.attempts
        }))
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
