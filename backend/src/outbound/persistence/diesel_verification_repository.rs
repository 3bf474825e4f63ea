//! PostgreSQL-backed `VerificationRepository`.
//!
//! Decisions run in one transaction: a conditional
//! `UPDATE ... WHERE id = $1 AND status = 'pending'` claims the record, and an
//! approval inserts the new account before commit. Zero updated rows means
//! the record is missing or already decided; a unique violation on
//! `users.email` rolls the whole decision back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{VerificationRepository, VerificationRepositoryError};
use crate::domain::{
    DecisionOutcome, Email, User, Verification, VerificationDecision, VerificationStatus,
};

use super::error_mapping::{is_unique_violation, map_corrupt_row, map_diesel_error, map_pool_error};
use super::models::{DecisionChangeset, NewUserRow, VerificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{users, verifications};

/// Diesel-backed application store.
#[derive(Clone)]
pub struct DieselVerificationRepository {
    pool: DbPool,
}

impl DieselVerificationRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> VerificationRepositoryError {
    map_pool_error(error, |m| VerificationRepositoryError::connection(m))
}

fn diesel_error(error: diesel::result::Error) -> VerificationRepositoryError {
    map_diesel_error(
        error,
        |m| VerificationRepositoryError::query(m),
        |m| VerificationRepositoryError::connection(m),
    )
}

fn to_verification(row: VerificationRow) -> Result<Verification, VerificationRepositoryError> {
    Verification::try_from(row)
        .map_err(|err| map_corrupt_row(err, |m| VerificationRepositoryError::query(m)))
}

/// Failure inside the decision transaction. Either variant rolls back.
enum DecideFailure {
    Diesel(diesel::result::Error),
    Rejected(VerificationRepositoryError),
}

impl From<diesel::result::Error> for DecideFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<VerificationRepositoryError> for DecideFailure {
    fn from(error: VerificationRepositoryError) -> Self {
        Self::Rejected(error)
    }
}

#[async_trait]
impl VerificationRepository for DieselVerificationRepository {
    async fn insert(&self, record: &Verification) -> Result<(), VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(verifications::table)
            .values(VerificationRow::from(record))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Verification>, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        verifications::table
            .find(id)
            .select(VerificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(to_verification)
            .transpose()
    }

    async fn find_pending_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Verification>, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        verifications::table
            .filter(verifications::email.eq(email.as_ref()))
            .filter(verifications::status.eq(VerificationStatus::Pending.as_str()))
            .select(VerificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(to_verification)
            .transpose()
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = verifications::table
            .select(VerificationRow::as_select())
            .order_by(verifications::submitted_at.desc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(verifications::status.eq(status.as_str()));
        }
        let rows: Vec<VerificationRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(to_verification).collect()
    }

    async fn decide(
        &self,
        id: &Uuid,
        decision: VerificationDecision,
    ) -> Result<DecisionOutcome, VerificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let id = *id;
        let result = conn
            .transaction::<DecisionOutcome, DecideFailure, _>(|conn| {
                async move {
                    let (reviewer, reviewed_at, reason) = match &decision {
                        VerificationDecision::Approve { reviewer, at, .. } => {
                            (reviewer, *at, None)
                        }
                        VerificationDecision::Reject {
                            reviewer,
                            at,
                            reason,
                        } => (reviewer, *at, Some(reason.as_str())),
                    };
                    let changes = DecisionChangeset {
                        status: decision.target_status().as_str(),
                        rejection_reason: reason,
                        reviewed_at,
                        reviewed_by: *reviewer.as_uuid(),
                    };

                    let claimed: Option<VerificationRow> = diesel::update(
                        verifications::table.filter(
                            verifications::id
                                .eq(id)
                                .and(verifications::status.eq(VerificationStatus::Pending.as_str())),
                        ),
                    )
                    .set(&changes)
                    .returning(VerificationRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                    let Some(row) = claimed else {
                        let existing: i64 = verifications::table
                            .filter(verifications::id.eq(id))
                            .count()
                            .get_result(conn)
                            .await?;
                        return Err(if existing == 0 {
                            VerificationRepositoryError::not_found(id).into()
                        } else {
                            VerificationRepositoryError::already_processed(id).into()
                        });
                    };
                    let verification = to_verification(row)?;

                    match decision {
                        VerificationDecision::Approve { user_id, at, .. } => {
                            let user: User = verification.approved_account().into_user(user_id, at);
                            match diesel::insert_into(users::table)
                                .values(NewUserRow::from(&user))
                                .execute(conn)
                                .await
                            {
                                Ok(_) => Ok(DecisionOutcome::Approved { verification, user }),
                                Err(err) if is_unique_violation(&err) => {
                                    Err(VerificationRepositoryError::email_taken(
                                        verification.email.to_string(),
                                    )
                                    .into())
                                }
                                Err(err) => Err(err.into()),
                            }
                        }
                        VerificationDecision::Reject { .. } => {
                            Ok(DecisionOutcome::Rejected { verification })
                        }
                    }
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|failure| match failure {
            DecideFailure::Diesel(err) => diesel_error(err),
            DecideFailure::Rejected(err) => err,
        })
    }
}
