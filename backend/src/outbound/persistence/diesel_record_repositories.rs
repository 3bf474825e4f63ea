//! PostgreSQL-backed stores for documents, transactions and notifications.
//!
//! All three are owner-keyed tables read newest first. One repository value
//! implements the three ports since they share a pool and error type.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    DocumentRepository, NotificationRepository, RecordRepositoryError, TransactionRepository,
};
use crate::domain::{Document, DocumentStatus, Notification, Transaction, UserId};

use super::error_mapping::{map_corrupt_row, map_diesel_error, map_pool_error};
use super::models::{CorruptRow, DocumentRow, NotificationRow, TransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{documents, notifications, transactions};

/// Diesel-backed store for user-owned records.
#[derive(Clone)]
pub struct DieselRecordRepository {
    pool: DbPool,
}

impl DieselRecordRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RecordRepositoryError {
    map_pool_error(error, |m| RecordRepositoryError::connection(m))
}

fn diesel_error(error: diesel::result::Error) -> RecordRepositoryError {
    map_diesel_error(
        error,
        |m| RecordRepositoryError::query(m),
        |m| RecordRepositoryError::connection(m),
    )
}

fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>, RecordRepositoryError>
where
    T: TryFrom<R, Error = CorruptRow>,
{
    rows.into_iter()
        .map(|row| {
            T::try_from(row).map_err(|err| map_corrupt_row(err, |m| RecordRepositoryError::query(m)))
        })
        .collect()
}

fn convert_one<R, T>(row: Option<R>) -> Result<Option<T>, RecordRepositoryError>
where
    T: TryFrom<R, Error = CorruptRow>,
{
    Ok(convert(row.into_iter().collect())?.pop())
}

#[async_trait]
impl DocumentRepository for DieselRecordRepository {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Document>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<DocumentRow> = documents::table
            .filter(documents::user_id.eq(user_id.as_uuid()))
            .order_by(documents::uploaded_at.desc())
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert(rows)
    }

    async fn insert(&self, document: &Document) -> Result<(), RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(documents::table)
            .values(DocumentRow::from(document))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn set_status(
        &self,
        id: &Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<DocumentRow> = diesel::update(documents::table.find(id))
            .set(documents::status.eq(status.as_str()))
            .returning(DocumentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        convert_one(row)
    }
}

#[async_trait]
impl TransactionRepository for DieselRecordRepository {
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Transaction>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::user_id.eq(user_id.as_uuid()))
            .order_by(transactions::created_at.desc())
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert(rows)
    }

    async fn insert(&self, transaction: &Transaction) -> Result<(), RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(transactions::table)
            .values(TransactionRow::from(transaction))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<TransactionRow> = transactions::table
            .order_by(transactions::created_at.desc())
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert(rows)
    }
}

#[async_trait]
impl NotificationRepository for DieselRecordRepository {
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .order_by(notifications::created_at.desc())
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert(rows)
    }

    async fn insert(&self, notification: &Notification) -> Result<(), RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(notifications::table)
            .values(NotificationRow::from(notification))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<NotificationRow> = notifications::table
            .find(id)
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        convert_one(row)
    }

    async fn mark_read(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<NotificationRow> = diesel::update(notifications::table.find(id))
            .set(notifications::read.eq(true))
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        convert_one(row)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changed = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id.as_uuid()))
                .filter(notifications::read.eq(false)),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(u64::try_from(changed).unwrap_or(u64::MAX))
    }
}
