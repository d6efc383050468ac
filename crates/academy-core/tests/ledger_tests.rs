//! XP ledger additivity and validation tests.

use std::sync::Arc;

use academy_core::storage::MemoryStore;
use academy_core::{AcademyError, XpLedger, XpReason};

#[test]
fn test_total_is_sum_of_grants() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));
    let amounts = [30i64, 50, 10, 10, 25];
    for (i, amount) in amounts.iter().enumerate() {
        ledger
            .grant("alice", *amount, XpReason::Other, &format!("grant {}", i))
            .unwrap();
    }
    assert_eq!(ledger.total_xp("alice").unwrap(), 125);
}

#[test]
fn test_total_unaffected_by_interleaved_users() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));
    ledger.grant("alice", 30, XpReason::LessonCompleted, "a1").unwrap();
    ledger.grant("bob", 500, XpReason::Other, "b1").unwrap();
    ledger.grant("alice", 20, XpReason::StepCompleted, "a2").unwrap();
    ledger.grant("bob", 1, XpReason::Other, "b2").unwrap();
    ledger.grant("alice", 50, XpReason::QuizCompleted, "a3").unwrap();

    assert_eq!(ledger.total_xp("alice").unwrap(), 100);
    assert_eq!(ledger.total_xp("bob").unwrap(), 501);
}

#[test]
fn test_unknown_user_has_zero_total() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));
    assert_eq!(ledger.total_xp("nobody").unwrap(), 0);
    assert!(ledger.history("nobody").unwrap().is_empty());
}

#[test]
fn test_invalid_amount_fails_loudly() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));
    for bad in [0i64, -1, -100] {
        let err = ledger.grant("alice", bad, XpReason::Other, "bad").unwrap_err();
        assert!(matches!(err, AcademyError::InvalidAmount(a) if a == bad));
    }
    // Nothing was appended.
    assert!(ledger.history("alice").unwrap().is_empty());
}

#[test]
fn test_oversized_amount_rejected_without_truncation() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));

    let too_big = u32::MAX as i64 + 30;
    let err = ledger
        .grant("alice", too_big, XpReason::Other, "import")
        .unwrap_err();
    assert!(matches!(err, AcademyError::InvalidAmount(a) if a == too_big));
    assert!(ledger.history("alice").unwrap().is_empty());
    assert_eq!(ledger.total_xp("alice").unwrap(), 0);

    // The largest representable amount is still accepted in full.
    ledger
        .grant("alice", u32::MAX as i64, XpReason::Other, "max")
        .unwrap();
    assert_eq!(ledger.total_xp("alice").unwrap(), u32::MAX as u64);
}

#[test]
fn test_history_is_append_only_and_ordered() {
    let ledger = XpLedger::new(Arc::new(MemoryStore::new()));
    for i in 0..10i64 {
        ledger
            .grant("alice", i + 1, XpReason::Other, &format!("grant {}", i))
            .unwrap();
    }
    let history = ledger.history("alice").unwrap();
    assert_eq!(history.len(), 10);
    for (i, event) in history.iter().enumerate() {
        assert_eq!(event.description, format!("grant {}", i));
    }
}
