//! Terminal rendering.
//!
//! Every function returns a `String`; handlers decide where it goes. Styling
//! goes through `console`, which drops colors when stdout is not a terminal.

use console::{style, StyledObject};
use memoraapp::backup::{CollectionOutcome, RestoreReport};
use memoraapp::commands::{CmdMessage, MessageLevel};
use memoraapp::config::MemoraConfig;
use memoraapp::model::{ClassicalTextLogEntry, VocabularyCard, WritingLogEntry};
use std::path::Path;

fn muted<D>(value: D) -> StyledObject<D> {
    style(value).dim()
}

fn heading<D>(value: D) -> StyledObject<D> {
    style(value).bold()
}

pub fn messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let line = match message.level {
            MessageLevel::Info => style(message.content.as_str()),
            MessageLevel::Success => style(message.content.as_str()).green(),
            MessageLevel::Warning => style(message.content.as_str()).yellow(),
            MessageLevel::Error => style(message.content.as_str()).red(),
        };
        out.push_str(&format!("{}\n", line));
    }
    out
}

pub fn cards(cards: &[VocabularyCard]) -> String {
    if cards.is_empty() {
        return format!("{}\n", muted("No vocabulary cards yet."));
    }
    let mut out = String::new();
    for card in cards {
        out.push_str(&heading(card.word()).to_string());
        if let Some(phonetic) = card.phonetic() {
            out.push_str(&format!(" {}", muted(phonetic)));
        }
        if !card.tags().is_empty() {
            let tags: Vec<&str> = card.tags().iter().map(String::as_str).collect();
            out.push_str(&format!("  {}", style(format!("[{}]", tags.join(", "))).cyan()));
        }
        if card.image().is_some() {
            out.push_str(&format!("  {}", muted("(image)")));
        }
        out.push('\n');
        out.push_str(&format!("    {}\n", card.definition()));
        if !card.translation().is_empty() {
            out.push_str(&format!("    {}\n", muted(card.translation())));
        }
        if !card.example().is_empty() {
            out.push_str(&format!("    e.g. {}\n", style(card.example()).italic()));
        }
    }
    out
}

pub fn writing_logs(entries: &[WritingLogEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", muted("No writing entries yet."));
    }
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{}  {}\n", muted(entry.id()), muted(entry.date())));
        out.push_str(&format!("    {}\n", entry.original()));
        if !entry.corrected().is_empty() {
            out.push_str(&format!("    {} {}\n", style("→").green(), entry.corrected()));
        }
        if !entry.feedback().is_empty() {
            out.push_str(&format!("    {}\n", muted(entry.feedback())));
        }
    }
    out
}

pub fn classical_logs(entries: &[ClassicalTextLogEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", muted("No classical entries yet."));
    }
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{}  {}", muted(entry.id()), muted(entry.date())));
        if !entry.origin().is_empty() {
            out.push_str(&format!("  {}", style(entry.origin()).cyan()));
        }
        out.push('\n');
        out.push_str(&format!("    {}\n", heading(entry.original())));
        out.push_str(&format!("    {}\n", entry.translation()));
    }
    out
}

fn outcome_line(outcome: &CollectionOutcome) -> String {
    let stored = outcome
        .stored
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());
    match &outcome.error {
        None => format!(
            "{}: {} added, {} already present, {} stored",
            outcome.kind, outcome.added, outcome.skipped, stored
        ),
        Some(_) => format!("{}: failed, {} stored", outcome.kind, stored),
    }
}

pub fn restore_report(report: &RestoreReport) -> String {
    let mut out = String::new();
    for outcome in &report.collections {
        let line = outcome_line(outcome);
        if outcome.succeeded() {
            out.push_str(&format!("{}\n", style(line).green()));
        } else {
            out.push_str(&format!("{}\n", style(line).red()));
        }
    }
    out
}

/// One line per collection that failed to restore.
pub fn restore_failures(report: &RestoreReport) -> Vec<String> {
    report
        .collections
        .iter()
        .filter_map(|outcome| {
            outcome
                .error
                .as_ref()
                .map(|e| format!("Warning: {} was not restored: {}", outcome.kind, e))
        })
        .collect()
}

pub fn exported(path: &Path) -> String {
    format!("Exported to {}\n", style(path.display()).bold())
}

pub fn config(config: &MemoraConfig, data_dir: &Path, backend: &str, ceiling: Option<usize>) -> String {
    let mut out = String::new();
    let ceiling = ceiling
        .map(|c| format!("{} bytes", c))
        .unwrap_or_else(|| "none".to_string());
    out.push_str(&format!("data_dir       = {}\n", data_dir.display()));
    out.push_str(&format!("backend        = {} ({})\n", config.backend, backend));
    out.push_str(&format!("quota          = {}\n", ceiling));
    out.push_str(&format!("migrate_legacy = {}\n", config.migrate_legacy));
    out.push_str(&format!("cleanup_legacy = {}\n", config.cleanup_legacy));
    out.push_str(&format!("{}\n", muted("[keys]")));
    let keys = &config.keys;
    for (name, value) in [
        ("vocabulary", &keys.vocabulary),
        ("writing_logs", &keys.writing_logs),
        ("classical_logs", &keys.classical_logs),
        ("session_mode", &keys.session_mode),
        ("session_drafts", &keys.session_drafts),
    ] {
        out.push_str(&format!("{:<14} = {}\n", name, value));
    }
    out
}
