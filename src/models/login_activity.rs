// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user, per-year login-day ledger.
//!
//! Every year uses the same 367-slot layout: slot 0 is unused, slots 1..=366
//! are the days of a leap year. In a non-leap year the February 29th slot
//! holds [`MISSING_DAY`] and every day from March 1st on is shifted up by one,
//! so a given calendar day always lands in the same slot.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time_utils::is_leap_year;

/// Number of slots in a ledger entry (index 0 unused).
pub const SLOT_COUNT: usize = 367;
/// Slot reserved for February 29th.
pub const LEAP_DAY_SLOT: usize = 60;

/// No login on this day.
pub const NO_LOGIN: i8 = 0;
/// At least one authenticated request on this day.
pub const LOGGED_IN: i8 = 1;
/// Sentinel for February 29th in a non-leap year.
pub const MISSING_DAY: i8 = -1;

/// First slot of each month in the leap layout, plus the end bound.
const MONTH_START_SLOTS: [usize; 13] = [1, 32, 61, 92, 122, 153, 183, 214, 245, 275, 306, 336, 367];

/// One ledger entry, keyed by `(user_id, year)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginActivity {
    pub user_id: Uuid,
    pub year: i32,
    /// Day markers, `SLOT_COUNT` long
    pub activity: Vec<i8>,
}

impl LoginActivity {
    /// Create an empty entry. The leap-day sentinel is written here and only here.
    pub fn new(user_id: Uuid, year: i32) -> Self {
        let mut activity = vec![NO_LOGIN; SLOT_COUNT];
        if !is_leap_year(year) {
            activity[LEAP_DAY_SLOT] = MISSING_DAY;
        }

        Self {
            user_id,
            year,
            activity,
        }
    }

    /// Mark `date` as a login day.
    ///
    /// Returns `true` if the entry changed. Dates outside this entry's year
    /// are ignored.
    pub fn mark(&mut self, date: NaiveDate) -> bool {
        if date.year() != self.year {
            return false;
        }

        let slot = slot_index(date);
        match self.activity.get_mut(slot) {
            Some(marker) if *marker == NO_LOGIN => {
                *marker = LOGGED_IN;
                true
            }
            _ => false,
        }
    }

    /// Whether `date` is marked as a login day.
    pub fn is_marked(&self, date: NaiveDate) -> bool {
        date.year() == self.year && self.activity.get(slot_index(date)) == Some(&LOGGED_IN)
    }

    /// Markers for `month` (1-12) in leap layout.
    ///
    /// February of a non-leap year yields 29 markers, the last being the
    /// sentinel.
    pub fn month_slice(&self, month: u32) -> Option<&[i8]> {
        let (start, end) = month_slot_bounds(month)?;
        self.activity.get(start..end)
    }

    /// All 366 day markers of the year (slot 0 excluded).
    pub fn year_slice(&self) -> &[i8] {
        &self.activity[1..]
    }
}

/// Ledger slot for a calendar day.
pub fn slot_index(date: NaiveDate) -> usize {
    let ordinal = date.ordinal() as usize;
    if !is_leap_year(date.year()) && ordinal >= LEAP_DAY_SLOT {
        ordinal + 1
    } else {
        ordinal
    }
}

/// Half-open slot range `[start, end)` covering `month`.
pub fn month_slot_bounds(month: u32) -> Option<(usize, usize)> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let m = month as usize;
    Some((MONTH_START_SLOTS[m - 1], MONTH_START_SLOTS[m]))
}
