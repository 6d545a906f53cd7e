// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login-day ledger operations.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::db::{LedgerStore, StoreError};
use crate::models::LoginActivity;

/// Ledger query failure.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("no login activity recorded for user {user_id} in {year}")]
    NotFound { user_id: Uuid, year: i32 },

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records login days and serves month/year projections.
#[derive(Clone)]
pub struct ActivityLedger<S> {
    store: S,
}

impl<S: LedgerStore> ActivityLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mark `date` as a login day, creating the year's entry on first use.
    ///
    /// Marking an already-marked day does not write.
    pub async fn record_login(&self, user_id: Uuid, date: NaiveDate) -> Result<(), StoreError> {
        let year = date.year();
        let mut entry = match self.store.load_ledger_entry(user_id, year).await? {
            Some(entry) => entry,
            None => {
                tracing::debug!(user_id = %user_id, year, "Creating login ledger entry");
                LoginActivity::new(user_id, year)
            }
        };

        if entry.mark(date) {
            self.store.save_ledger_entry(&entry).await?;
        }
        Ok(())
    }

    /// Markers for one month of `year`.
    pub async fn month_slice(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<i8>, LedgerError> {
        let entry = self.load(user_id, year).await?;
        entry
            .month_slice(month)
            .map(<[i8]>::to_vec)
            .ok_or(LedgerError::InvalidMonth(month))
    }

    /// All day markers of `year`.
    pub async fn year_slice(&self, user_id: Uuid, year: i32) -> Result<Vec<i8>, LedgerError> {
        let entry = self.load(user_id, year).await?;
        Ok(entry.year_slice().to_vec())
    }

    async fn load(&self, user_id: Uuid, year: i32) -> Result<LoginActivity, LedgerError> {
        self.store
            .load_ledger_entry(user_id, year)
            .await?
            .ok_or(LedgerError::NotFound { user_id, year })
    }
}
