use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use filepurge::cli::args::{Cli, Commands, ConfigAction, OutputFormat};
use filepurge::cli::output;
use filepurge::common::config::{Config, PurgeJob};
use filepurge::common::format;
use filepurge::purge::{Decision, PurgeEngine, PurgeReport};
use filepurge::volume::{Entry, LocalVolume};
use filepurge::CacheExpiryEngine;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _log_guard = init_logging(&cli)?;

    match cli.command {
        Commands::Files {
            ref rule_sets,
            dry_run,
            debug,
            yes,
        } => cmd_files(&cli, rule_sets, dry_run, debug, yes),

        Commands::Cache {
            ref path,
            dry_run,
            debug,
            yes,
        } => cmd_cache(&cli, path.as_deref(), dry_run, debug, yes),

        Commands::Config { ref action } => cmd_config(&cli, action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                filepurge::cli::args::CompletionShell::Bash => clap_complete::Shell::Bash,
                filepurge::cli::args::CompletionShell::Zsh => clap_complete::Shell::Zsh,
                filepurge::cli::args::CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "filepurge", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// stderr logging (`--verbose` or `RUST_LOG`), plus an optional rolling file
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = if cli.verbose {
        EnvFilter::new("filepurge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "filepurge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::config_path)
}

fn is_human(cli: &Cli) -> bool {
    matches!(cli.format, OutputFormat::Human)
}

/// Interactive confirmation; only possible in human output mode
fn confirmed(cli: &Cli, yes: bool, question: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !is_human(cli) {
        anyhow::bail!("Confirmation required: pass --yes when using --format json or quiet");
    }
    output::confirm(question, true)
}

fn print_reports(cli: &Cli, reports: &[PurgeReport]) -> Result<()> {
    match cli.format {
        OutputFormat::Human => Ok(()),
        OutputFormat::Json => output::print_reports_json(reports),
        OutputFormat::Quiet => {
            output::print_reports_quiet(reports);
            Ok(())
        }
    }
}

// ─── Files ────────────────────────────────────────────────────────────────────

fn cmd_files(cli: &Cli, requested: &[String], dry_run: bool, debug: bool, yes: bool) -> Result<()> {
    let path = config_path(cli);
    let config = Config::load(&path)?;

    let names = if requested.is_empty() {
        config.rule_set_names()
    } else {
        requested.to_vec()
    };

    // Resolve every rule set and its volume before touching anything
    let jobs = names
        .iter()
        .map(|name| -> filepurge::Result<(PurgeJob, LocalVolume)> {
            let job = config.job(name)?;
            let volume = job.open_volume()?;
            Ok((job, volume))
        })
        .collect::<filepurge::Result<Vec<_>>>()?;

    if jobs.is_empty() {
        if is_human(cli) && !cli.quiet {
            println!(
                "  No rule sets configured in {}",
                format::format_path(&path).cyan()
            );
        }
        return print_reports(cli, &[]);
    }

    let mut reports = Vec::new();

    for (job, volume) in &jobs {
        if !confirmed(cli, yes, &format!("Purge rule set `{}`?", job.name))? {
            continue;
        }

        if is_human(cli) && !cli.quiet {
            println!(
                "  {} Purging `{}` on {}...",
                "🧹",
                job.name.bold(),
                format::format_path(volume.root()).cyan()
            );
        }

        let report = run_files(cli, job, volume, dry_run, debug);
        if is_human(cli) && !cli.quiet {
            output::print_files_summary(&report);
        }
        reports.push(report);
    }

    print_reports(cli, &reports)
}

fn run_files(cli: &Cli, job: &PurgeJob, volume: &LocalVolume, dry_run: bool, debug: bool) -> PurgeReport {
    let start = Instant::now();
    let show_debug = debug && is_human(cli);
    let pb = (is_human(cli) && !cli.quiet && !show_debug).then(|| output::spinner("Scanning..."));

    let mut report = PurgeReport::new(&job.name, dry_run);
    let engine = PurgeEngine::new(&job.rules, volume);

    let purged = engine.purge_with(&mut |entry: &Entry, deleting: bool| {
        report.record_entry(entry, deleting);
        if let Some(ref pb) = pb {
            pb.set_message(output::spinner_message(&entry.path));
        }
        if show_debug {
            output::print_candidate(&entry.path, deleting, dry_run);
        }
        if dry_run {
            Decision::Keep
        } else {
            Decision::UseDefault
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    report.purged = purged;
    report.duration_secs = start.elapsed().as_secs_f64();
    report
}

// ─── Cache ────────────────────────────────────────────────────────────────────

fn cmd_cache(cli: &Cli, path: Option<&Path>, dry_run: bool, debug: bool, yes: bool) -> Result<()> {
    let config = Config::load(&config_path(cli))?;
    let root = config.cache_dir(path)?;

    if !confirmed(cli, yes, "Purge all expired file caches?")? {
        return print_reports(cli, &[]);
    }

    let start = Instant::now();
    let human = is_human(cli) && !cli.quiet;
    let show_debug = debug && is_human(cli);
    if human {
        println!("  {} Purging {}...", "🧹", format::format_path(&root).cyan());
    }
    let pb = (human && !show_debug).then(|| output::spinner("Scanning cache..."));

    let mut report = PurgeReport::new(root.display().to_string(), dry_run);
    let engine = CacheExpiryEngine::new(&root);

    let purged = engine.purge_with(&mut |file: &Path, expired: bool| {
        report.record_cache_file(file, expired);
        let shown = file.display().to_string();
        if let Some(ref pb) = pb {
            pb.set_message(output::spinner_message(&shown));
        }
        if show_debug {
            output::print_candidate(&shown, expired, dry_run);
        }
        if dry_run {
            Decision::Keep
        } else {
            Decision::UseDefault
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    report.purged = purged;
    report.duration_secs = start.elapsed().as_secs_f64();

    if human {
        output::print_cache_summary(&report);
    }
    print_reports(cli, &[report])
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = config_path(cli);

    match action {
        ConfigAction::Show => {
            let config = Config::load(&path)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                _ => output::print_config(&config, &path)?,
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::template()
                .save(&path)
                .with_context(|| format!("Failed to write config: {}", path.display()))?;
            println!("  {} Wrote {}", "✓".green(), format::format_path(&path));
        }
    }

    Ok(())
}
