//! Command handlers for academyctl.

use std::sync::Arc;

use academy_core::achievements::catalogue;
use academy_core::leveling;
use academy_core::{Academy, ActivityItem, JsonFileStore, StaticIdentity, XpOutcome};
use anyhow::{anyhow, Context, Result};
use owo_colors::OwoColorize;

/// Width of the XP progress bar in `stats` output.
const BAR_WIDTH: usize = 24;

fn data_dir() -> Result<std::path::PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| anyhow!("no data directory available"))?;
    Ok(base.join("mcp-academy"))
}

fn open() -> Result<(Academy, String)> {
    let user = std::env::var("USER").context("cannot determine user; set $USER")?;
    let store = Arc::new(JsonFileStore::new(data_dir()?));
    let identity = Arc::new(StaticIdentity::signed_in(&user));
    Ok((Academy::new(store, identity), user))
}

fn report_outcome(outcome: &XpOutcome) {
    println!(
        "{} +{} XP ({})",
        "[xp]".green(),
        outcome.event.amount,
        outcome.event.description
    );
    if let Some(level) = outcome.leveled_up_to {
        println!(
            "{} Level up! You are now level {} - {}",
            "[up]".yellow(),
            level,
            leveling::level_title(level).bold()
        );
    }
    for earned in &outcome.newly_earned {
        if let Some(def) = catalogue().iter().find(|d| d.id == earned.achievement_id) {
            println!(
                "{} Achievement unlocked: {} - {}",
                "[**]".cyan(),
                def.title.bold(),
                def.description
            );
        }
    }
}

pub fn stats() -> Result<()> {
    let (academy, user) = open()?;

    let total = academy.total_xp(&user)?;
    let level = academy.level(&user)?;
    let to_next = academy.xp_to_next_level(&user)?;
    let streak = academy.streak(&user)?;

    let percent = leveling::progress_percent(total);
    let filled = (percent / 100.0 * BAR_WIDTH as f32).round() as usize;
    let bar = format!(
        "[{}{}]",
        "=".repeat(filled.min(BAR_WIDTH)),
        " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
    );

    println!("{}", format!("MCP Academy - {}", user).bold());
    println!(
        "  Level {} - {}",
        level.to_string().yellow(),
        leveling::level_title(level)
    );
    println!("  {} {} XP total, {} to next level", bar, total, to_next);
    if streak.current_streak > 0 {
        println!(
            "  Streak: {} day(s) (best {})",
            streak.current_streak.to_string().green(),
            streak.best_streak
        );
    }

    let statuses = academy.achievement_statuses(&user)?;
    let earned = statuses.iter().filter(|s| s.earned).count();
    println!("  Achievements: {}/{}", earned, statuses.len());
    Ok(())
}

pub fn lesson(id: &str) -> Result<()> {
    let (academy, _) = open()?;
    match academy.complete_lesson(id)? {
        Some(outcome) => report_outcome(&outcome),
        None => println!("{} Lesson {} was already completed", "[--]".dimmed(), id),
    }
    Ok(())
}

pub fn quiz(id: &str, score: u32) -> Result<()> {
    let (academy, _) = open()?;
    match academy.complete_quiz(id, score)? {
        Some(outcome) => report_outcome(&outcome),
        None => println!("{} Quiz recorded, no XP granted", "[--]".dimmed()),
    }
    Ok(())
}

pub fn step(path: &str, index: u32, undo: bool) -> Result<()> {
    let (academy, _) = open()?;
    if undo {
        academy.uncomplete_step(path, index)?;
        println!("{} Step {} of {} marked incomplete", "[--]".dimmed(), index, path);
    } else {
        match academy.complete_step(path, index)? {
            Some(outcome) => report_outcome(&outcome),
            None => println!("{} Step {} of {} was already complete", "[--]".dimmed(), index, path),
        }
    }
    Ok(())
}

pub fn activity(limit: usize) -> Result<()> {
    let (academy, user) = open()?;
    let feed = academy.recent_activity(&user, limit)?;
    if feed.is_empty() {
        println!("No activity yet. Complete a lesson to get started.");
        return Ok(());
    }
    for item in feed {
        match item {
            ActivityItem::StepCompleted {
                path_type,
                step_index,
                at,
            } => {
                println!("{} {} step {} ({})", "[ok]".green(), path_type, step_index, at.format("%Y-%m-%d %H:%M"));
            }
            ActivityItem::TutorialCompleted { tutorial_id, at } => {
                println!("{} tutorial {} ({})", "[ok]".green(), tutorial_id, at.format("%Y-%m-%d %H:%M"));
            }
            ActivityItem::AchievementEarned { achievement_id, at } => {
                println!("{} achievement {} ({})", "[**]".cyan(), achievement_id, at.format("%Y-%m-%d %H:%M"));
            }
        }
    }
    Ok(())
}

pub fn achievements() -> Result<()> {
    let (academy, user) = open()?;
    let statuses = academy.achievement_statuses(&user)?;
    for def in catalogue() {
        let status = statuses
            .iter()
            .find(|s| s.achievement_id == def.id)
            .ok_or_else(|| anyhow!("missing status for {}", def.id))?;
        if status.earned {
            println!("{} {} - {}", "[x]".green(), def.title.bold(), def.description);
        } else {
            println!("{} {} - {}", "[ ]".dimmed(), def.title, def.description);
        }
    }
    Ok(())
}

pub fn export() -> Result<()> {
    let (academy, user) = open()?;
    let bundle = academy.export_user(&user)?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

pub fn reset(yes: bool) -> Result<()> {
    if !yes {
        return Err(anyhow!("refusing to purge without --yes"));
    }
    let (academy, user) = open()?;
    academy.clear_user(&user)?;
    println!("All records for {} cleared.", user);
    Ok(())
}
