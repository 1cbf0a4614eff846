use chrono::{FixedOffset, TimeZone, Utc};
use playall::catalog::{Backoff, RetryPolicy, WalkReport};
use playall::config::build_retry_policy;
use playall::utils::*;
use std::time::Duration;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    assert_ne!(verifier, generate_code_verifier());
}

#[test]
fn test_generate_code_challenge() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );

    // Same input, same challenge
    assert_eq!(
        generate_code_challenge("abc"),
        generate_code_challenge("abc")
    );

    // URL-safe base64 without padding
    let challenge = generate_code_challenge(&generate_code_verifier());
    assert_eq!(challenge.len(), 43);
    assert!(!challenge.contains('='));
    assert!(!challenge.contains('+'));
    assert!(!challenge.contains('/'));
}

#[test]
fn test_generate_state() {
    let state = generate_state();

    assert_eq!(state.len(), 32);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(state, generate_state());
}

#[test]
fn test_playlist_name_format() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 42).unwrap();
    assert_eq!(playlist_name(&at), "2024-03-09 07:05");
}

#[test]
fn test_playlist_name_uses_local_offset() {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let at = offset.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap();

    // Whatever the offset, the wall-clock time of that offset is printed
    assert_eq!(playlist_name(&at), "2023-12-31 23:59");
}

#[test]
fn test_summary_rows() {
    let report = WalkReport {
        artists: 2,
        albums_seen: 5,
        albums_kept: 4,
        duplicates_dropped: 1,
        tracks_seen: 40,
        tracks_excluded: 3,
        tracks_written: 37,
        write_calls: 1,
        retry_waits: 2,
        ..Default::default()
    };

    let rows = summary_rows(&report);
    let lookup = |metric: &str| {
        rows.iter()
            .find(|r| r.metric == metric)
            .map(|r| r.value.clone())
    };

    assert_eq!(lookup("artists").as_deref(), Some("2"));
    assert_eq!(lookup("duplicates dropped").as_deref(), Some("1"));
    assert_eq!(lookup("remixes excluded").as_deref(), Some("3"));
    assert_eq!(lookup("tracks written").as_deref(), Some("37"));
    assert_eq!(lookup("retry waits").as_deref(), Some("2"));
    assert_eq!(lookup("skipped chunks").as_deref(), Some("0"));
}

#[test]
fn test_build_retry_policy_bounded() {
    let policy = build_retry_policy(4, 500, 8_000);

    assert_eq!(policy.max_attempts, Some(4));
    assert_eq!(
        policy.backoff,
        Backoff::Exponential {
            initial: Duration::from_millis(500),
            max: Duration::from_millis(8_000),
        }
    );
}

#[test]
fn test_build_retry_policy_zero_is_unbounded() {
    let policy = build_retry_policy(0, 1_000, 32_000);

    assert_eq!(policy, RetryPolicy::unbounded(Duration::from_secs(1)));
    assert_eq!(policy.max_attempts, None);
}

#[test]
fn test_build_retry_policy_cap_never_below_initial() {
    let policy = build_retry_policy(3, 2_000, 100);

    assert_eq!(policy.backoff.delay(1), Duration::from_millis(2_000));
    assert_eq!(policy.backoff.delay(5), Duration::from_millis(2_000));
}
