//! Leveling policy: pure mapping from total XP to level.
//!
//! Level is always derived from total XP, never stored as independent
//! truth. Each level costs 100 XP more than the previous: cumulative
//! thresholds 0, 100, 300, 600, 1000, ...

/// Cumulative XP required to reach `level`. Level 1 starts at 0.
pub fn xp_threshold(level: u32) -> u64 {
    let n = level.saturating_sub(1) as u64;
    100 * n * (n + 1) / 2
}

/// Largest level whose threshold is within `total_xp`. Always >= 1,
/// monotone non-decreasing in `total_xp`.
pub fn level_for_xp(total_xp: u64) -> u32 {
    let mut level = 1;
    while xp_threshold(level + 1) <= total_xp {
        level += 1;
    }
    level
}

/// XP still missing before the next level.
pub fn xp_to_next_level(total_xp: u64) -> u64 {
    let next = level_for_xp(total_xp) + 1;
    xp_threshold(next) - total_xp
}

/// Position within the current level band, 0..=100. For the stats bar.
pub fn progress_percent(total_xp: u64) -> f32 {
    let level = level_for_xp(total_xp);
    let floor = xp_threshold(level);
    let ceiling = xp_threshold(level + 1);
    100.0 * (total_xp - floor) as f32 / (ceiling - floor) as f32
}

/// Display title for a level tier.
pub fn level_title(level: u32) -> &'static str {
    match level {
        1 => "Curious Newcomer",
        2 => "Protocol Apprentice",
        3 => "Context Explorer",
        4 => "Tool-Call Tinkerer",
        5 => "Server Wrangler",
        6 => "Integration Adept",
        7 => "Resource Sage",
        8 => "Protocol Architect",
        _ => "MCP Grandmaster",
    }
}
