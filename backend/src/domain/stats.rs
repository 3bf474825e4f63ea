//! Point-in-time aggregate reporting.
//!
//! Every call scans all users and all transactions. There is no
//! materialised view; the figures always reflect current state.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use mockable::Clock;
use serde::Serialize;
use utoipa::ToSchema;

use super::ports::{TransactionRepository, UserRepository};
use super::{Error, Role, Transaction, TransactionStatus, User, UserId, UserStatus};

/// Headline figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub active_users: usize,
    /// Sum of completed transaction amounts.
    pub revenue: f64,
    /// Active share of all users, in percent, one decimal place.
    pub growth_rate: f64,
}

/// Per-role head count for the super-admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UsersByRole {
    pub admins: usize,
    pub vendors: usize,
    pub customers: usize,
    pub brokers: usize,
    pub investors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuperAdminStats {
    #[serde(flatten)]
    pub platform: PlatformStats,
    pub users_by_role: UsersByRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserDistribution {
    pub customer: usize,
    pub vendor: usize,
    pub broker: usize,
    pub investor: usize,
    pub admin: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyUsers {
    /// e.g. `Mar 2026`.
    pub month: String,
    pub users: usize,
    pub cumulative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityTrends {
    pub active: usize,
    pub inactive: usize,
    pub pending: usize,
    /// Accounts with either verification flag set.
    pub verified: usize,
    pub unverified: usize,
}

/// Twelve-month analytics payload.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub user_distribution: UserDistribution,
    pub user_growth: Vec<MonthlyUsers>,
    pub revenue_trends: Vec<MonthlyRevenue>,
    pub activity_trends: ActivityTrends,
}

const TRAILING_MONTHS: i32 = 12;

/// Half-open calendar month `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthWindow {
    fn back_from(now: DateTime<Utc>, months_back: i32) -> Option<Self> {
        let index = now.year() * 12 + now.month0().cast_signed() - months_back;
        let start = first_of(index)?;
        let end = first_of(index + 1)?;
        Some(Self { start, end })
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.start && day < self.end
    }

    fn label(&self) -> String {
        self.start.format("%b %Y").to_string()
    }
}

fn first_of(month_index: i32) -> Option<NaiveDate> {
    let year = month_index.div_euclid(12);
    let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn count(users: &[User], pred: impl Fn(&User) -> bool) -> usize {
    users.iter().filter(|u| pred(u)).count()
}

#[expect(clippy::cast_precision_loss, reason = "user counts are far below 2^52")]
fn growth_rate(active: usize, total: usize) -> f64 {
    if active == 0 || total == 0 {
        return 0.0;
    }
    round_one_decimal(active as f64 / total as f64 * 100.0)
}

/// Aggregations over the user and transaction stores.
#[derive(Clone)]
pub struct StatsService {
    users: Arc<dyn UserRepository>,
    transactions: Arc<dyn TransactionRepository>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        transactions: Arc<dyn TransactionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            transactions,
            clock,
        }
    }

    /// All users plus the completed transactions that belong to one of them.
    async fn snapshot(&self) -> Result<(Vec<User>, Vec<Transaction>), Error> {
        let users = self.users.list(None).await?;
        let known: HashSet<UserId> = users.iter().map(|u| u.id).collect();
        let completed = self
            .transactions
            .list_all()
            .await?
            .into_iter()
            .filter(|t| t.status == TransactionStatus::Completed && known.contains(&t.user_id))
            .collect();
        Ok((users, completed))
    }

    fn platform(users: &[User], completed: &[Transaction]) -> PlatformStats {
        let total_users = users.len();
        let active_users = count(users, |u| u.status == UserStatus::Active);
        PlatformStats {
            total_users,
            active_users,
            revenue: completed.iter().map(|t| t.amount).sum(),
            growth_rate: growth_rate(active_users, total_users),
        }
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, Error> {
        let (users, completed) = self.snapshot().await?;
        Ok(Self::platform(&users, &completed))
    }

    pub async fn super_admin_stats(&self) -> Result<SuperAdminStats, Error> {
        let (users, completed) = self.snapshot().await?;
        let by_role = |role: Role| count(&users, |u| u.role == role);
        Ok(SuperAdminStats {
            platform: Self::platform(&users, &completed),
            users_by_role: UsersByRole {
                admins: by_role(Role::Admin),
                vendors: by_role(Role::Vendor),
                customers: by_role(Role::Customer),
                brokers: by_role(Role::Broker),
                investors: by_role(Role::Investor),
            },
        })
    }

    pub async fn analytics(&self) -> Result<Analytics, Error> {
        let (users, completed) = self.snapshot().await?;
        let now = self.clock.utc();
        let windows: Vec<MonthWindow> = (0..TRAILING_MONTHS)
            .rev()
            .filter_map(|back| MonthWindow::back_from(now, back))
            .collect();

        let user_growth = windows
            .iter()
            .map(|w| MonthlyUsers {
                month: w.label(),
                users: count(&users, |u| w.contains(u.created_at)),
                cumulative: count(&users, |u| u.created_at.date_naive() < w.end),
            })
            .collect();
        let revenue_trends = windows
            .iter()
            .map(|w| MonthlyRevenue {
                month: w.label(),
                revenue: completed
                    .iter()
                    .filter(|t| w.contains(t.created_at))
                    .map(|t| t.amount)
                    .sum(),
            })
            .collect();

        let by_role = |role: Role| count(&users, |u| u.role == role);
        let by_status = |status: UserStatus| count(&users, |u| u.status == status);
        let verified = count(&users, |u| u.verified || u.is_email_verified);
        Ok(Analytics {
            user_distribution: UserDistribution {
                customer: by_role(Role::Customer),
                vendor: by_role(Role::Vendor),
                broker: by_role(Role::Broker),
                investor: by_role(Role::Investor),
                admin: by_role(Role::Admin),
            },
            user_growth,
            revenue_trends,
            activity_trends: ActivityTrends {
                active: by_status(UserStatus::Active),
                inactive: by_status(UserStatus::Inactive),
                pending: by_status(UserStatus::Pending),
                verified,
                unverified: users.len() - verified,
            },
        })
    }
}
