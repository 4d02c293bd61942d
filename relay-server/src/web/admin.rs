//! Read-only admin views over the stored submissions.

use axum::{extract::State, Json};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::submission::{Submission, SubmissionKind};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Records of `kind`, most recent first.
async fn load_sorted(state: &AppState, kind: SubmissionKind) -> Result<Vec<Submission>, ApiError> {
    let mut records = state
        .pipeline
        .store()
        .list_all(kind)
        .await
        .map_err(|e| ApiError::load(kind.collection(), e))?;

    records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    Ok(records)
}

async fn listing(state: &AppState, kind: SubmissionKind) -> Result<Json<Value>, ApiError> {
    let records = load_sorted(state, kind).await?;

    Ok(Json(json!({
        "total": records.len(),
        kind.collection(): records,
    })))
}

/// GET /api/admin/quotes
pub async fn list_quotes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    listing(&state, SubmissionKind::Quote).await
}

/// GET /api/admin/contacts
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    listing(&state, SubmissionKind::Contact).await
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub quotes: usize,
    pub contacts: usize,
    pub all: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Counts {
    pub quotes: usize,
    pub contacts: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: Totals,
    pub today: Counts,
    pub this_week: Counts,
    pub this_month: Counts,
}

/// Local midnight of `date`. Falls back to reading the wall time as UTC when
/// midnight does not exist locally (DST gap).
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// Bucket counts relative to `now`. Bucket starts are inclusive.
pub fn compute_stats(quotes: &[Submission], contacts: &[Submission], now: DateTime<Local>) -> Stats {
    let today = local_midnight(now.date_naive());
    let this_week = now.with_timezone(&Utc) - Duration::days(7);
    let this_month = local_midnight(now.date_naive().with_day(1).unwrap_or(now.date_naive()));

    let since = |records: &[Submission], start: DateTime<Utc>| {
        records.iter().filter(|r| r.submitted_at >= start).count()
    };
    let bucket = |start: DateTime<Utc>| Counts {
        quotes: since(quotes, start),
        contacts: since(contacts, start),
    };

    Stats {
        total: Totals {
            quotes: quotes.len(),
            contacts: contacts.len(),
            all: quotes.len() + contacts.len(),
        },
        today: bucket(today),
        this_week: bucket(this_week),
        this_month: bucket(this_month),
    }
}

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let store = state.pipeline.store();
    let (quotes, contacts) = tokio::join!(
        store.list_all(SubmissionKind::Quote),
        store.list_all(SubmissionKind::Contact)
    );

    let quotes = quotes.map_err(|e| ApiError::load("stats", e))?;
    let contacts = contacts.map_err(|e| ApiError::load("stats", e))?;

    Ok(Json(compute_stats(&quotes, &contacts, Local::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{contact_at, quote_at};

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
            .earliest()
            .unwrap()
    }

    fn utc(at: DateTime<Local>) -> DateTime<Utc> {
        at.with_timezone(&Utc)
    }

    #[test]
    fn test_empty_collections() {
        let stats = compute_stats(&[], &[], local(2024, 3, 15, 10));
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_buckets() {
        let now = local(2024, 3, 15, 10);

        let quotes = vec![
            quote_at("quote_today", utc(local(2024, 3, 15, 1))),
            quote_at("quote_3_days", utc(local(2024, 3, 12, 9))),
            quote_at("quote_last_month", utc(local(2024, 2, 20, 9))),
        ];
        let contacts = vec![
            contact_at("contact_midnight", utc(local(2024, 3, 15, 0))),
            contact_at("contact_yesterday", utc(local(2024, 3, 14, 23))),
            contact_at("contact_10_days", utc(local(2024, 3, 5, 12))),
        ];

        let stats = compute_stats(&quotes, &contacts, now);

        assert_eq!(stats.total, Totals { quotes: 3, contacts: 3, all: 6 });
        // Local midnight is inclusive
        assert_eq!(stats.today, Counts { quotes: 1, contacts: 1 });
        assert_eq!(stats.this_week, Counts { quotes: 2, contacts: 2 });
        assert_eq!(stats.this_month, Counts { quotes: 2, contacts: 3 });
    }

    #[test]
    fn test_week_is_rolling_seven_days() {
        let now = local(2024, 3, 15, 10);
        let edge = now.with_timezone(&Utc) - Duration::days(7);

        let quotes = vec![
            quote_at("quote_edge", edge),
            quote_at("quote_before_edge", edge - Duration::milliseconds(1)),
        ];

        let stats = compute_stats(&quotes, &[], now);

        assert_eq!(stats.this_week.quotes, 1);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let value = serde_json::to_value(Stats::default()).unwrap();

        assert!(value.get("thisWeek").is_some());
        assert!(value.get("thisMonth").is_some());
        assert_eq!(value["total"]["all"], 0);
    }
}
