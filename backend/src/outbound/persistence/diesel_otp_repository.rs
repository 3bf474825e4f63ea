//! PostgreSQL-backed `OtpRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{OtpRepository, OtpRepositoryError};
use crate::domain::{Email, OtpPurpose, OtpRecord};

use super::error_mapping::{map_corrupt_row, map_diesel_error, map_pool_error};
use super::models::OtpRow;
use super::pool::{DbPool, PoolError};
use super::schema::otps;

/// Diesel-backed OTP store.
#[derive(Clone)]
pub struct DieselOtpRepository {
    pool: DbPool,
}

impl DieselOtpRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> OtpRepositoryError {
    map_pool_error(error, |m| OtpRepositoryError::connection(m))
}

fn diesel_error(error: diesel::result::Error) -> OtpRepositoryError {
    map_diesel_error(
        error,
        |m| OtpRepositoryError::query(m),
        |m| OtpRepositoryError::connection(m),
    )
}

#[async_trait]
impl OtpRepository for DieselOtpRepository {
    async fn replace(&self, record: &OtpRecord) -> Result<(), OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = OtpRow::from(record);
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    otps::table
                        .filter(otps::email.eq(&row.email))
                        .filter(otps::purpose.eq(&row.purpose)),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(otps::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn find_live(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<OtpRow> = otps::table
            .filter(otps::email.eq(email.as_ref()))
            .filter(otps::purpose.eq(purpose.as_str()))
            .filter(otps::expires_at.gt(now))
            .order_by(otps::created_at.desc())
            .select(OtpRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(|row| {
            OtpRecord::try_from(row)
                .map_err(|err| map_corrupt_row(err, |m| OtpRepositoryError::query(m)))
        })
        .transpose()
    }

    async fn increment_attempts(&self, id: &Uuid) -> Result<u32, OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let attempts: Option<i32> = diesel::update(otps::table.find(id))
            .set(otps::attempts.eq(otps::attempts + 1))
            .returning(otps::attempts)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        attempts
            .map(|value| u32::try_from(value).unwrap_or(0))
            .ok_or_else(|| OtpRepositoryError::query(format!("otp {id} not found")))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(otps::table.find(id))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
