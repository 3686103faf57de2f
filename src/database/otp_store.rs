//! 验证码记录的存储接口。
//!
//! 存储只保证单条操作的原子性（插入、按条件删除、查最新）；
//! 签发流程里的“先删后插”不在同一事务中。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query, UpdateStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::otp_record_entity as otp_records;
use crate::error::AppResult;
use crate::models::OtpRecord;

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// 删除该手机号的全部记录，返回删除条数
    async fn delete_by_phone(&self, phone: &str) -> AppResult<u64>;

    async fn insert(&self, record: OtpRecord) -> AppResult<()>;

    /// 按 created_at 倒序取该手机号最新的一条
    async fn find_latest(&self, phone: &str) -> AppResult<Option<OtpRecord>>;

    /// 删除单条记录；返回 0 表示已被其他请求消费
    async fn delete_by_id(&self, id: Uuid) -> AppResult<u64>;

    /// 失败次数 +1，返回新的次数；记录不存在时返回 None
    async fn increment_attempts(&self, id: Uuid) -> AppResult<Option<i32>>;

    /// 清理 cutoff 之前创建的记录
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    async fn ping(&self) -> AppResult<()>;
}

/// `UPDATE ... SET attempts = attempts + 1 WHERE id = ? RETURNING attempts`
fn increment_attempts_statement(id: Uuid) -> UpdateStatement {
    Query::update()
        .table(otp_records::Entity)
        .value(
            otp_records::Column::Attempts,
            Expr::col(otp_records::Column::Attempts).add(1),
        )
        .and_where(Expr::col(otp_records::Column::Id).eq(id))
        .returning_col(otp_records::Column::Attempts)
        .to_owned()
}

#[derive(Clone)]
pub struct SeaOrmOtpStore {
    pool: DatabaseConnection,
}

impl SeaOrmOtpStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for SeaOrmOtpStore {
    async fn delete_by_phone(&self, phone: &str) -> AppResult<u64> {
        let res = otp_records::Entity::delete_many()
            .filter(otp_records::Column::Phone.eq(phone))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    async fn insert(&self, record: OtpRecord) -> AppResult<()> {
        let am = otp_records::ActiveModel {
            id: Set(record.id),
            phone: Set(record.phone),
            code_hash: Set(record.code_hash),
            attempts: Set(record.attempts),
            created_at: Set(record.created_at),
        };
        otp_records::Entity::insert(am)
            .exec_without_returning(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_latest(&self, phone: &str) -> AppResult<Option<OtpRecord>> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::Phone.eq(phone))
            .order_by_desc(otp_records::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        Ok(model.map(OtpRecord::from))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<u64> {
        let res = otp_records::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    async fn increment_attempts(&self, id: Uuid) -> AppResult<Option<i32>> {
        let stmt = self
            .pool
            .get_database_backend()
            .build(&increment_attempts_statement(id));
        let Some(row) = self.pool.query_one(stmt).await? else {
            return Ok(None);
        };
        let attempts: i32 = row.try_get("", "attempts")?;
        Ok(Some(attempts))
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let res = otp_records::Entity::delete_many()
            .filter(otp_records::Column::CreatedAt.lt(cutoff))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    async fn ping(&self) -> AppResult<()> {
        self.pool.ping().await?;
        Ok(())
    }
}
