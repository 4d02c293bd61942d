//! Record id generation.
//!
//! Ids look like `quote_1718000000000_k2j4h5g6f`: kind, epoch milliseconds of
//! acceptance, nine base-36 characters. They are practically unique; no
//! uniqueness check is made against the store.

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;

use super::types::SubmissionKind;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a record id for a submission accepted at `at`.
pub fn generate_id(kind: SubmissionKind, at: DateTime<Utc>) -> Result<String> {
    let millis = u64::try_from(at.timestamp_millis())
        .context("acceptance time is before the unix epoch")?;

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    Ok(format!("{}_{}_{}", kind.as_str(), millis, suffix))
}

/// Current time at millisecond precision, the resolution ids and
/// `submittedAt` stamps share.
pub fn acceptance_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        let at = Utc.timestamp_millis_opt(1_718_000_000_123).unwrap();
        let id = generate_id(SubmissionKind::Contact, at).unwrap();

        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "contact");
        assert_eq!(parts[1], "1718000000123");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_practically_unique() {
        let at = acceptance_time();
        let ids: HashSet<String> = (0..500)
            .map(|_| generate_id(SubmissionKind::Quote, at).unwrap())
            .collect();

        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_pre_epoch_time_rejected() {
        let at = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        assert!(generate_id(SubmissionKind::Quote, at).is_err());
    }

    #[test]
    fn test_acceptance_time_has_millisecond_precision() {
        let at = acceptance_time();
        assert_eq!(at.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
