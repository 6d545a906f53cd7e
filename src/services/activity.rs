// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login activity and streak bookkeeping.
//!
//! Runs once per authenticated request:
//! 1. Load the user's last login date and streak
//! 2. Mark today in the yearly ledger
//! 3. Extend or reset the streak if today has not been counted yet

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{LedgerStore, StoreError, UserStore};
use crate::models::Principal;
use crate::services::ledger::ActivityLedger;

/// Per-user locks serialising the streak read-modify-write within this process.
///
/// An entry only lives while a recorder run for that user is in flight, so the
/// map is bounded by the number of concurrently active users.
pub type ActivityLocks = Arc<DashMap<Uuid, Arc<Mutex<()>>>>;

/// How a login day changes the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Today was already counted.
    Unchanged,
    /// Last login was yesterday.
    Incremented,
    /// First login ever, or a gap of more than one day.
    Reset,
}

impl StreakUpdate {
    /// Classify the transition from `last_login` to `today`.
    ///
    /// A last login in the future (clock skew) counts as already counted.
    pub fn between(last_login: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(last) = last_login else {
            return StreakUpdate::Reset;
        };

        match (today - last).num_days() {
            gap if gap <= 0 => StreakUpdate::Unchanged,
            1 => StreakUpdate::Incremented,
            _ => StreakUpdate::Reset,
        }
    }

    /// New streak value from the current one.
    pub fn apply(self, streak: u32) -> u32 {
        match self {
            StreakUpdate::Unchanged => streak,
            StreakUpdate::Incremented => streak.saturating_add(1),
            StreakUpdate::Reset => 1,
        }
    }
}

/// Result of one recorder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The principal does not map to a stored user.
    UnknownUser,
    Recorded { update: StreakUpdate, streak: u32 },
}

/// Updates the login ledger and streak for authenticated callers.
#[derive(Clone)]
pub struct ActivityRecorder<S> {
    store: S,
    ledger: ActivityLedger<S>,
    locks: ActivityLocks,
}

impl<S: UserStore + LedgerStore + Clone> ActivityRecorder<S> {
    pub fn new(store: S, locks: ActivityLocks) -> Self {
        Self {
            ledger: ActivityLedger::new(store.clone()),
            store,
            locks,
        }
    }

    pub fn ledger(&self) -> &ActivityLedger<S> {
        &self.ledger
    }

    /// Record that `principal` was active on `today`.
    pub async fn record(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<RecordOutcome, StoreError> {
        let Ok(user_id) = Uuid::parse_str(&principal.user_id) else {
            tracing::warn!(user_id = %principal.user_id, "Principal user ID is not a UUID");
            return Ok(RecordOutcome::UnknownUser);
        };

        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = {
            let _guard = lock.lock().await;
            self.record_locked(user_id, today).await
        };

        // Prune the entry once no other run holds or waits on it. The shard
        // lock taken by `remove_if` keeps `entry` from handing out a clone
        // while the count is checked.
        drop(lock);
        self.locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        outcome
    }

    async fn record_locked(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<RecordOutcome, StoreError> {
        let Some(mut user) = self.store.load_user_record(user_id).await? else {
            tracing::warn!(user_id = %user_id, "Active principal has no user record");
            return Ok(RecordOutcome::UnknownUser);
        };

        self.ledger.record_login(user_id, today).await?;

        let update = StreakUpdate::between(user.last_login_date, today);
        if update == StreakUpdate::Unchanged {
            return Ok(RecordOutcome::Recorded {
                update,
                streak: user.login_streak,
            });
        }

        user.login_streak = update.apply(user.login_streak);
        user.last_login_date = Some(today);
        self.store.save_user_record(&user).await?;

        tracing::debug!(
            user_id = %user_id,
            streak = user.login_streak,
            update = ?update,
            "Login streak updated"
        );

        Ok(RecordOutcome::Recorded {
            update,
            streak: user.login_streak,
        })
    }
}
