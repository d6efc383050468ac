//! Leveling policy contract tests.

use academy_core::leveling::{level_for_xp, xp_threshold, xp_to_next_level};

#[test]
fn test_concrete_level_thresholds() {
    assert_eq!(level_for_xp(0), 1);
    assert_eq!(level_for_xp(99), 1);
    assert_eq!(level_for_xp(100), 2);
    assert_eq!(level_for_xp(299), 2);
    assert_eq!(level_for_xp(300), 3);
    assert_eq!(level_for_xp(599), 3);
    assert_eq!(level_for_xp(600), 4);
}

#[test]
fn test_level_monotone_non_decreasing() {
    for a in (0..5000).step_by(7) {
        for delta in [0u64, 1, 50, 500] {
            assert!(
                level_for_xp(a) <= level_for_xp(a + delta),
                "level decreased between {} and {}",
                a,
                a + delta
            );
        }
    }
}

#[test]
fn test_level_is_pure() {
    for _ in 0..3 {
        assert_eq!(level_for_xp(12345), level_for_xp(12345));
    }
}

#[test]
fn test_each_level_costs_100n_more() {
    for n in 1..20u32 {
        let step = xp_threshold(n + 1) - xp_threshold(n);
        assert_eq!(step as u32, 100 * n);
    }
}

#[test]
fn test_xp_to_next_level_consistent_with_thresholds() {
    for total in [0u64, 42, 99, 100, 250, 599, 600, 4321] {
        let level = level_for_xp(total);
        assert_eq!(xp_to_next_level(total), xp_threshold(level + 1) - total);
    }
}
