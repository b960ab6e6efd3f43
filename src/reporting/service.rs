use std::{collections::HashSet, sync::Arc};

use thiserror::Error;
use time::{macros::time, Date, Duration, OffsetDateTime, PrimitiveDateTime};

use crate::auth::SessionClaims;

use super::{
    models::{ChatMessageRecord, ChatThreadRecord, WeeklySummary},
    store::{StoreError, ThreadStore},
};

pub const DEFAULT_WEEKS_BACK: usize = 6;

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("you are not authorized to perform this action")]
    NotAuthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admin-only queries over the chat document store.
pub struct ReportingService<S> {
    store: Arc<S>,
}

impl<S: ThreadStore> ReportingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn threads_page(
        &self,
        user: &SessionClaims,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ChatThreadRecord>, ReportingError> {
        require_admin(user)?;
        Ok(self.store.threads_page(limit, offset)?)
    }

    pub fn thread_messages(
        &self,
        user: &SessionClaims,
        thread_id: &str,
    ) -> Result<Vec<ChatMessageRecord>, ReportingError> {
        require_admin(user)?;
        Ok(self.store.thread_messages(thread_id)?)
    }

    /// Summaries for the last `weeks_back` UTC weeks including the current
    /// one, newest week first, empty weeks zero-filled.
    pub fn weekly_summaries(
        &self,
        user: &SessionClaims,
        weeks_back: usize,
    ) -> Result<Vec<WeeklySummary>, ReportingError> {
        require_admin(user)?;
        let weeks_back = weeks_back.max(1);
        let today = OffsetDateTime::now_utc().date();
        let (start, end) = week_window(today, weeks_back);
        let records = self.store.threads_created_between(start, end)?;
        Ok(summarize_weeks(&records, weeks_back, today))
    }
}

fn require_admin(user: &SessionClaims) -> Result<(), ReportingError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ReportingError::NotAuthorized)
    }
}

/// The UTC Monday starting the week `date` falls in.
fn monday_of(date: Date) -> Date {
    date - Duration::days(date.weekday().number_days_from_monday() as i64)
}

fn week_start(monday: Date) -> OffsetDateTime {
    monday.midnight().assume_utc()
}

fn week_end(monday: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(monday + Duration::days(6), time!(23:59:59.999)).assume_utc()
}

/// Inclusive query window covering `weeks_back` weeks ending with the week
/// of `today`.
pub fn week_window(today: Date, weeks_back: usize) -> (OffsetDateTime, OffsetDateTime) {
    let this_monday = monday_of(today);
    let earliest_monday = this_monday - Duration::weeks(weeks_back.saturating_sub(1) as i64);
    (week_start(earliest_monday), week_end(this_monday))
}

/// Bucket records into contiguous UTC Monday–Sunday weeks, newest first.
///
/// Weeks without records appear with zero counts; records outside the window
/// are ignored. Unique users are counted per bucket over
/// [`ChatThreadRecord::user_key`].
pub fn summarize_weeks(
    records: &[ChatThreadRecord],
    weeks_back: usize,
    today: Date,
) -> Vec<WeeklySummary> {
    let weeks_back = weeks_back.max(1);
    let this_monday = monday_of(today);
    let earliest_monday = this_monday - Duration::weeks(weeks_back.saturating_sub(1) as i64);

    let mut conversations = vec![0usize; weeks_back];
    let mut users: Vec<HashSet<&str>> = vec![HashSet::new(); weeks_back];

    for record in records {
        let monday = monday_of(record.created_at.date());
        let offset_days = (monday - earliest_monday).whole_days();
        if offset_days < 0 || offset_days % 7 != 0 {
            continue;
        }
        let index = (offset_days / 7) as usize;
        if index >= weeks_back {
            continue;
        }
        conversations[index] += 1;
        if let Some(key) = record.user_key() {
            users[index].insert(key);
        }
    }

    (0..weeks_back)
        .rev()
        .map(|index| {
            let monday = earliest_monday + Duration::weeks(index as i64);
            WeeklySummary {
                week_start: week_start(monday),
                week_end: week_end(monday),
                unique_users: users[index].len(),
                conversations: conversations[index],
            }
        })
        .collect()
}
