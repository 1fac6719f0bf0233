//! End-of-run counter reports.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templar_core::{ExportStats, RestoreStats};
use templar_sync::{ExportReport, RestoreReport, SyncOutcome};

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "counter")]
    counter: String,
    #[tabled(rename = "value")]
    value: usize,
}

#[derive(Serialize)]
struct ExportSummaryJson<'a> {
    outcome: &'static str,
    commit_message: Option<&'a str>,
    repository: Option<&'a str>,
    deletions: Vec<String>,
    counters: &'a ExportStats,
}

#[derive(Serialize)]
struct RestoreSummaryJson<'a> {
    payload_dump: Option<String>,
    counters: &'a RestoreStats,
}

fn outcome_key(outcome: &SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::CompareOnly => "compare_only",
        SyncOutcome::NoChanges => "no_changes",
        SyncOutcome::NothingToCommit => "nothing_to_commit",
        SyncOutcome::Pushed { .. } => "pushed",
    }
}

fn counter_table(rows: Vec<(&'static str, usize)>) -> Table {
    let rows: Vec<CounterRow> = rows
        .into_iter()
        .map(|(counter, value)| CounterRow {
            counter: counter.to_string(),
            value,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::blank());
    table
}

pub(crate) fn print_export(
    report: &ExportReport,
    browse_url: Option<&str>,
    json: bool,
) -> Result<()> {
    if json {
        let payload = ExportSummaryJson {
            outcome: outcome_key(&report.outcome),
            commit_message: match &report.outcome {
                SyncOutcome::Pushed { message } => Some(message.as_str()),
                _ => None,
            },
            repository: browse_url,
            deletions: report.deletions.iter().map(ToString::to_string).collect(),
            counters: &report.stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize summary JSON")?
        );
        return Ok(());
    }

    println!("{}", "Results".bold());
    println!("{}", counter_table(report.stats.rows()));
    let line = match &report.outcome {
        SyncOutcome::CompareOnly => "compare-only run, repository untouched".yellow(),
        SyncOutcome::NoChanges => "repository already up to date".green(),
        SyncOutcome::NothingToCommit => "no effective changes to commit".yellow(),
        SyncOutcome::Pushed { message } => format!("pushed: {message}").green(),
    };
    println!("{line}");
    if let Some(url) = browse_url {
        println!("{url}");
    }
    if report.stats.file_copy_errors > 0 {
        println!(
            "{}",
            format!("{} file(s) could not be copied", report.stats.file_copy_errors).red()
        );
    }
    Ok(())
}

pub(crate) fn print_restore(report: &RestoreReport, json: bool) -> Result<()> {
    if json {
        let payload = RestoreSummaryJson {
            payload_dump: report
                .payload_dump
                .as_ref()
                .map(|p| p.display().to_string()),
            counters: &report.stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize summary JSON")?
        );
        return Ok(());
    }

    println!("{}", "Results".bold());
    println!("{}", counter_table(report.stats.rows()));
    if report.stats.has_failures() {
        println!("{}", "some projects or templates failed; see the log".red());
    }
    Ok(())
}
