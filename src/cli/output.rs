use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use crate::common::config::Config;
use crate::common::format;
use crate::purge::PurgeReport;

/// Print one candidate line (`--debug`)
pub fn print_candidate(path: &str, deleting: bool, dry_run: bool) {
    let prefix = if dry_run {
        format!("{} ", "[DRY-RUN]".magenta())
    } else {
        String::new()
    };
    let check = if deleting { "✘".red() } else { "✔".green() };
    println!("  - {}{} {}", prefix, check, path);
}

/// Print the summary for a rule set run
pub fn print_files_summary(report: &PurgeReport) {
    println!(
        "  {} Purged {} files and/or directories{}  {}",
        "✓".green(),
        report.purged.to_string().bold(),
        dry_run_note(report),
        format::format_duration(report.duration_secs).dimmed()
    );
    println!();
}

/// Print the summary for a cache run
pub fn print_cache_summary(report: &PurgeReport) {
    println!(
        "  {} Purged {} cache file(s){}  {}",
        "✓".green(),
        report.purged.to_string().bold(),
        dry_run_note(report),
        format::format_duration(report.duration_secs).dimmed()
    );
    println!();
}

fn dry_run_note(report: &PurgeReport) -> String {
    if report.dry_run {
        format!(
            " ({} would be removed)",
            format::format_count(report.deleting_count(), "candidate")
        )
        .magenta()
        .to_string()
    } else {
        String::new()
    }
}

/// Print reports as JSON
pub fn print_reports_json(reports: &[PurgeReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

/// Print reports in quiet mode: `target<TAB>purged`
pub fn print_reports_quiet(reports: &[PurgeReport]) {
    for report in reports {
        println!("{}\t{}", report.target, report.purged);
    }
}

/// Print the effective configuration
pub fn print_config(config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    println!();
    println!("{}", "filepurge configuration".bold().underline());
    println!("  {}: {}", "file".dimmed(), format::format_path(path));
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Ask a yes/no question on stdin. Empty input (or closed stdin) takes
/// the default.
pub fn confirm(question: &str, default_yes: bool) -> anyhow::Result<bool> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    print!("  {} {} {} ", "❓", question, hint);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim();

    Ok(if answer.is_empty() {
        default_yes
    } else {
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    })
}

/// Spinner showing the current candidate
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Shorten a candidate path for the spinner line
pub fn spinner_message(path: &str) -> String {
    format::truncate_left(path, 60)
}
