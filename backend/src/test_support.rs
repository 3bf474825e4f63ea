//! Shared test doubles for unit tests across the crate.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    MailError, Mailer, NotificationPublisher, OutboundEmail, PasswordHashError, PasswordHasher,
    PublishError,
};
use crate::domain::{Notification, PasswordHash, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// 2026-03-01T09:00:00Z.
    pub fn fixed() -> Arc<Self> {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Arc::new(Self::new(start))
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *lock(&self.0) += TimeDelta::minutes(minutes);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Mailer that records every message and optionally fails.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<(), MailError> {
        lock(&self.sent).push(message.clone());
        if self.fail {
            Err(MailError::not_configured())
        } else {
            Ok(())
        }
    }
}

/// Publisher that records pushes instead of delivering them.
#[derive(Default)]
pub struct RecordingPublisher(Mutex<Vec<(UserId, Notification)>>);

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(UserId, Notification)> {
        lock(&self.0).clone()
    }
}

impl NotificationPublisher for RecordingPublisher {
    fn publish(&self, user_id: &UserId, notification: &Notification) -> Result<usize, PublishError> {
        lock(&self.0).push((*user_id, notification.clone()));
        Ok(1)
    }
}

/// Reversible "hash" so tests stay fast and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHashError> {
        Ok(PasswordHash::new(format!("plain:{raw}")))
    }

    fn verify(&self, raw: &str, hash: &PasswordHash) -> bool {
        hash.as_str().strip_prefix("plain:") == Some(raw)
    }
}
