//! PostgreSQL-backed `MapRegistrationRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MapRegistrationRepository, RecordRepositoryError};
use crate::domain::{MapRegistration, Pincode, UserId};

use super::error_mapping::{map_corrupt_row, map_diesel_error, map_pool_error};
use super::models::MapRegistrationRow;
use super::pool::{DbPool, PoolError};
use super::schema::map_registrations;

/// Diesel-backed marker store. The unique `user_id` constraint turns a
/// second registration into an update of the first.
#[derive(Clone)]
pub struct DieselMapRegistrationRepository {
    pool: DbPool,
}

impl DieselMapRegistrationRepository {
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

fn to_registration(row: MapRegistrationRow) -> Result<MapRegistration, RecordRepositoryError> {
    MapRegistration::try_from(row)
        .map_err(|err| map_corrupt_row(err, |m| RecordRepositoryError::query(m)))
}

#[async_trait]
impl MapRegistrationRepository for DieselMapRegistrationRepository {
    async fn upsert(
        &self,
        registration: &MapRegistration,
    ) -> Result<MapRegistration, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = MapRegistrationRow::from(registration);
        let stored: MapRegistrationRow = diesel::insert_into(map_registrations::table)
            .values(&row)
            .on_conflict(map_registrations::user_id)
            .do_update()
            .set((
                map_registrations::name.eq(excluded(map_registrations::name)),
                map_registrations::email.eq(excluded(map_registrations::email)),
                map_registrations::role.eq(excluded(map_registrations::role)),
                map_registrations::address.eq(excluded(map_registrations::address)),
                map_registrations::pincode.eq(excluded(map_registrations::pincode)),
                map_registrations::locality.eq(excluded(map_registrations::locality)),
                map_registrations::latitude.eq(excluded(map_registrations::latitude)),
                map_registrations::longitude.eq(excluded(map_registrations::longitude)),
                map_registrations::updated_at.eq(excluded(map_registrations::updated_at)),
            ))
            .returning(MapRegistrationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        to_registration(stored)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<MapRegistration>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        map_registrations::table
            .filter(map_registrations::user_id.eq(user_id.as_uuid()))
            .select(MapRegistrationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(to_registration)
            .transpose()
    }

    async fn list(
        &self,
        pincode: Option<Pincode>,
    ) -> Result<Vec<MapRegistration>, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = map_registrations::table
            .select(MapRegistrationRow::as_select())
            .order_by(map_registrations::updated_at.desc())
            .into_boxed();
        if let Some(pincode) = pincode {
            query = query.filter(map_registrations::pincode.eq(pincode.as_str().to_owned()));
        }
        let rows: Vec<MapRegistrationRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(to_registration).collect()
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, RecordRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let removed = diesel::delete(
            map_registrations::table.filter(map_registrations::user_id.eq(user_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(removed > 0)
    }
}
