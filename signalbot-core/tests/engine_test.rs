//! Integration tests for the engine facade.
//!
//! Tests:
//! 1. Free-tier quota: issuance, remaining footer, denial at the limit
//! 2. Subscriptions: grant resets the counter, paid requests are free, expiry
//! 3. Best-effort persistence: failed writes keep in-memory effects
//! 4. Concurrency: one user hammered from many threads never exceeds the quota
//! 5. Restart: records and history survive a reload through the JSON file store,
//!    and a malformed record on disk drops only that user

use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use signalbot_core::rng;
use signalbot_core::{
    DenialReason, Engine, EngineConfig, JsonFileStore, ManualClock, MemoryStore, RecordStore,
    StatusFooter, UserId, ValidationError,
};

type TestEngine = Engine<Arc<MemoryStore>, Arc<ManualClock>>;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(16, 1, 30)
        .unwrap()
}

fn abc_config(limit: u32) -> EngineConfig {
    EngineConfig {
        free_signal_limit: limit,
        instruments: vec!["A".into(), "B".into(), "C".into()],
        admin_contact: "desk".into(),
        ..EngineConfig::default()
    }
}

fn build(config: EngineConfig) -> (TestEngine, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let engine =
        Engine::with_parts(config, Arc::clone(&store), Arc::clone(&clock), rng::seeded(42))
            .unwrap();
    (engine, store, clock)
}

// ── 1. Free tier ─────────────────────────────────────────────────────

#[test]
fn free_tier_scenario_with_limit_two() {
    let (engine, store, _clock) = build(abc_config(2));
    let user = UserId(1);

    let first = engine.request_signal(user).unwrap();
    assert_eq!(first.footer, StatusFooter::Remaining { remaining: 1 });
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 1);

    let second = engine.request_signal(user).unwrap();
    assert_eq!(second.footer, StatusFooter::Remaining { remaining: 0 });
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 2);

    let writes = store.write_count();
    let denial = engine.request_signal(user).unwrap_err();
    assert_eq!(denial.reason, DenialReason::FreeLimitReached { limit: 2 });
    assert!(denial.to_string().contains("Contact admin: @desk"));
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 2);
    assert_eq!(store.write_count(), writes);
}

#[test]
fn each_free_request_increments_by_exactly_one() {
    let (engine, _store, _clock) = build(abc_config(20));
    let user = UserId(77);
    for expected in 1..=20u32 {
        let issued = engine.request_signal(user).unwrap();
        assert_eq!(engine.record(user).unwrap().free_uses_consumed, expected);
        assert_eq!(
            issued.footer,
            StatusFooter::Remaining {
                remaining: 20 - expected
            }
        );
    }
    assert!(engine.request_signal(user).is_err());
}

#[test]
fn signals_use_even_minute_slots() {
    let (engine, _store, _clock) = build(abc_config(20));
    let issued = engine.request_signal(UserId(2)).unwrap();
    // 16:01:30 + 3 min = 16:04:30 -> 16:04:00
    assert_eq!(
        issued.signal.execute_at,
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(16, 4, 0)
            .unwrap()
    );
}

#[test]
fn consecutive_signals_avoid_recent_instruments() {
    let (engine, _store, _clock) = build(abc_config(20));
    let user = UserId(3);
    let a = engine.request_signal(user).unwrap().signal.instrument;
    let b = engine.request_signal(user).unwrap().signal.instrument;
    let c = engine.request_signal(user).unwrap().signal.instrument;
    // with three instruments and a window of six, the first three draws are distinct
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
    // the fourth falls back to the full catalog and still succeeds
    engine.request_signal(user).unwrap();
}

#[test]
fn users_do_not_share_quota() {
    let (engine, _store, _clock) = build(abc_config(1));
    engine.request_signal(UserId(10)).unwrap();
    assert!(engine.request_signal(UserId(10)).is_err());
    assert!(engine.request_signal(UserId(11)).is_ok());
}

// ── 2. Subscriptions ─────────────────────────────────────────────────

#[test]
fn grant_on_fresh_id_then_requests_are_free_until_expiry() {
    let (engine, _store, clock) = build(abc_config(20));
    let user = UserId(42);

    let grant = engine.grant_subscription(user, Some(30)).unwrap();
    assert_eq!(grant.paid_until, start() + Duration::days(30));
    let record = engine.record(user).unwrap();
    assert_eq!(record.free_uses_consumed, 0);
    assert_eq!(record.paid_until, Some(start() + Duration::days(30)));

    for _ in 0..50 {
        let issued = engine.request_signal(user).unwrap();
        assert_eq!(
            issued.footer,
            StatusFooter::Subscribed {
                until: grant.paid_until.date()
            }
        );
    }
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 0);

    // exactly at paid_until the subscription no longer counts
    clock.set(grant.paid_until);
    let issued = engine.request_signal(user).unwrap();
    assert_eq!(issued.footer, StatusFooter::Remaining { remaining: 19 });
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 1);
}

#[test]
fn grant_resets_exhausted_counter() {
    let (engine, _store, _clock) = build(abc_config(2));
    let user = UserId(5);
    engine.request_signal(user).unwrap();
    engine.request_signal(user).unwrap();
    assert!(engine.request_signal(user).is_err());

    engine.grant_subscription(user, Some(7)).unwrap();
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 0);
    assert!(engine.request_signal(user).is_ok());
}

#[test]
fn expired_and_exhausted_user_gets_expiry_denial() {
    let (engine, _store, clock) = build(abc_config(1));
    let user = UserId(6);
    let grant = engine.grant_subscription(user, Some(1)).unwrap();
    clock.advance(Duration::days(2));
    engine.request_signal(user).unwrap();
    let denial = engine.request_signal(user).unwrap_err();
    assert_eq!(
        denial.reason,
        DenialReason::SubscriptionExpired {
            expired_at: grant.paid_until
        }
    );
}

#[test]
fn grant_validation_leaves_state_untouched() {
    let (engine, store, _clock) = build(abc_config(20));
    let err = engine.grant_subscription(UserId(8), Some(0)).unwrap_err();
    assert_eq!(err, ValidationError::NonPositiveDays(0));
    assert!(engine.record(UserId(8)).is_none());
    assert_eq!(store.write_count(), 0);
}

#[test]
fn grant_persists_immediately() {
    let (engine, store, _clock) = build(abc_config(20));
    engine.grant_subscription(UserId(12), None).unwrap();
    assert_eq!(store.write_count(), 1);
    let text = store.contents().unwrap();
    assert!(text.contains("\"12\""));
    assert!(text.contains("2026-11-18 16:01:30"));
}

// ── 3. Best-effort persistence ───────────────────────────────────────

#[test]
fn failed_save_keeps_in_memory_effect() {
    let (engine, store, _clock) = build(abc_config(20));
    store.set_fail_writes(true);
    let issued = engine.request_signal(UserId(20));
    assert!(issued.is_ok());
    assert_eq!(engine.record(UserId(20)).unwrap().free_uses_consumed, 1);
    assert_eq!(store.write_count(), 0);

    store.set_fail_writes(false);
    engine.request_signal(UserId(20)).unwrap();
    assert_eq!(store.load()[&UserId(20)].free_uses_consumed, 2);
}

// ── 4. Concurrency ───────────────────────────────────────────────────

#[test]
fn concurrent_requests_never_exceed_quota() {
    let (engine, _store, _clock) = build(abc_config(20));
    let engine = Arc::new(engine);
    let user = UserId(99);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..10)
                    .filter(|_| engine.request_signal(user).is_ok())
                    .count()
            })
        })
        .collect();
    let issued: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(issued, 20);
    assert_eq!(engine.record(user).unwrap().free_uses_consumed, 20);
}

// ── 5. Restart ───────────────────────────────────────────────────────

#[test]
fn records_survive_restart_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users_data.json");
    let clock = Arc::new(ManualClock::new(start()));
    let config = EngineConfig {
        data_file: path.clone(),
        ..abc_config(20)
    };

    {
        let engine = Engine::with_parts(
            config.clone(),
            JsonFileStore::new(&path),
            Arc::clone(&clock),
            rng::seeded(1),
        )
        .unwrap();
        engine.request_signal(UserId(1)).unwrap();
        engine.request_signal(UserId(1)).unwrap();
        engine.grant_subscription(UserId(2), Some(10)).unwrap();
    }

    let engine = Engine::with_parts(
        config,
        JsonFileStore::new(&path),
        Arc::clone(&clock),
        rng::seeded(2),
    )
    .unwrap();
    assert_eq!(engine.user_count(), 2);
    let one = engine.record(UserId(1)).unwrap();
    assert_eq!(one.free_uses_consumed, 2);
    assert_eq!(one.history.len(), 2);
    let two = engine.status(UserId(2)).unwrap();
    assert!(two.entitlement.is_subscribed());
}

#[test]
fn malformed_record_on_disk_does_not_wipe_other_users() {
    let store = Arc::new(MemoryStore::with_contents(
        r#"{
  "1": { "signals": 3, "paid_until": "2026-11-18 09:30:00" },
  "2": { "signals": -1, "paid_until": null }
}"#,
    ));
    let clock = Arc::new(ManualClock::new(start()));
    let engine = Engine::with_parts(
        abc_config(20),
        Arc::clone(&store),
        Arc::clone(&clock),
        rng::seeded(8),
    )
    .unwrap();
    assert_eq!(engine.user_count(), 1);

    engine.request_signal(UserId(3)).unwrap();

    let reloaded = store.load();
    let one = &reloaded[&UserId(1)];
    assert_eq!(one.free_uses_consumed, 3);
    assert!(one.paid_until.is_some());
    assert!(engine.status(UserId(1)).unwrap().entitlement.is_subscribed());
    assert!(reloaded.contains_key(&UserId(3)));
    assert!(!reloaded.contains_key(&UserId(2)));
}

#[test]
fn history_is_bounded_by_retention() {
    let config = EngineConfig {
        non_repetition_window: 2,
        history_retention: 3,
        ..abc_config(20)
    };
    let (engine, _store, _clock) = build(config);
    for _ in 0..10 {
        engine.request_signal(UserId(4)).unwrap();
    }
    assert_eq!(engine.record(UserId(4)).unwrap().history.len(), 3);
}
