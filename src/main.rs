//! CLI entry point for `mboxcompact`.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mboxcompact::config::Config;
use mboxcompact::model::message::Message;
use mboxcompact::parser::mbox::decode_archive;
use mboxcompact::parser::parse_archive;
use mboxcompact::pipeline::{self, CompactOptions};
use mboxcompact::render;
use mboxcompact::summary::normalize_thread_summary;

#[derive(Parser)]
#[command(
    name = "mboxcompact",
    version,
    about = "Compact mailing-list threads and patch series",
    after_help = "FILE may be '-' to read an archive from standard input."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the messages of one or more archives
    Parse {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Summarize a thread
    Summary {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Messages kept after deduplication
        #[arg(long, value_name = "N")]
        max_messages: Option<usize>,
        /// Keep quoted replies and signatures in bodies
        #[arg(long)]
        keep_quoted: bool,
        /// Truncate bodies longer than N bytes
        #[arg(long, value_name = "N")]
        short_body_bytes: Option<usize>,
        /// Approximate output budget in tokens
        #[arg(long, value_name = "N")]
        token_budget: Option<usize>,
        /// Pool subjects and participants
        #[arg(long)]
        normalized: bool,
        #[arg(long)]
        json: bool,
    },
    /// Aggregate the patch series in a thread
    Patchset {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Files rendered per patch, largest change first
        #[arg(long, value_name = "N")]
        max_files: Option<usize>,
        #[arg(long, value_name = "N")]
        max_hunks_per_file: Option<usize>,
        #[arg(long, value_name = "N")]
        max_hunk_lines: Option<usize>,
        /// Omit rendered diffs
        #[arg(long)]
        no_diffs: bool,
        /// Only report diff statistics
        #[arg(long)]
        stat_only: bool,
        /// Approximate output budget in tokens
        #[arg(long, value_name = "N")]
        token_budget: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = mboxcompact::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Parse { files, json } => cmd_parse(&files, json),
        Commands::Summary {
            files,
            max_messages,
            keep_quoted,
            short_body_bytes,
            token_budget,
            normalized,
            json,
        } => {
            let mut options = CompactOptions::from_config(&config)?;
            if let Some(n) = max_messages {
                options.summary.max_messages = n;
            }
            if keep_quoted {
                options.summary.strip_quoted = false;
            }
            if let Some(n) = short_body_bytes {
                options.summary.short_body_bytes = n;
            }
            apply_budget_override(&mut options, &config, token_budget);
            options.validate()?;
            cmd_summary(&files, &options, normalized, json)
        }
        Commands::Patchset {
            files,
            max_files,
            max_hunks_per_file,
            max_hunk_lines,
            no_diffs,
            stat_only,
            token_budget,
            json,
        } => {
            let mut options = CompactOptions::from_config(&config)?;
            let diff = &mut options.patchset.diff;
            if let Some(n) = max_files {
                diff.max_files = n;
            }
            if let Some(n) = max_hunks_per_file {
                diff.max_hunks_per_file = n;
            }
            if let Some(n) = max_hunk_lines {
                diff.max_hunk_lines = n;
            }
            if no_diffs {
                options.patchset.include_diffs = false;
            }
            if stat_only {
                options.patchset.stat_only = true;
            }
            apply_budget_override(&mut options, &config, token_budget);
            options.validate()?;
            cmd_patchset(&files, &options, json)
        }
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_path = mboxcompact::config::log_file_path(config);
    let log_target = log_path
        .parent()
        .zip(log_path.file_name())
        .filter(|(dir, _)| std::fs::create_dir_all(dir).is_ok());

    if let Some((log_dir, file_name)) = log_target {
        let file_appender = tracing_appender::rolling::never(log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// `--token-budget` on the command line wins over the config file.
fn apply_budget_override(options: &mut CompactOptions, config: &Config, budget: Option<usize>) {
    if let Some(n) = budget {
        options.token_budget = Some(config.budget.token_budget_for(n));
    }
}

/// Read every input, each parsed as its own archive, in argument order.
fn read_messages(files: &[PathBuf]) -> anyhow::Result<Vec<Message>> {
    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Reading [{bar:40.cyan/blue}] {pos}/{len} files")
                .expect("valid template")
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut messages = Vec::new();
    for file in files {
        let raw = read_input(file)?;
        let parsed = parse_archive(&raw);
        tracing::debug!(file = %file.display(), messages = parsed.len(), "Parsed input");
        messages.extend(parsed);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(messages)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return Ok(decode_archive(&bytes));
    }
    Ok(pipeline::read_archive(path)?)
}

/// List parsed messages.
fn cmd_parse(files: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let messages = read_messages(files)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else {
        println!("{}", render::render_messages(&messages));
    }
    Ok(())
}

/// Summarize the thread formed by all inputs.
fn cmd_summary(
    files: &[PathBuf],
    options: &CompactOptions,
    normalized: bool,
    json: bool,
) -> anyhow::Result<()> {
    let messages = read_messages(files)?;
    let summary = pipeline::summarize_messages(messages, options);

    match (normalized, json) {
        (true, true) => println!(
            "{}",
            serde_json::to_string_pretty(&normalize_thread_summary(&summary))?
        ),
        (true, false) => println!(
            "{}",
            render::render_normalized_summary(&normalize_thread_summary(&summary))
        ),
        (false, true) => println!("{}", serde_json::to_string_pretty(&summary)?),
        (false, false) => println!("{}", render::render_summary(&summary)),
    }
    Ok(())
}

/// Aggregate the patch series formed by all inputs.
fn cmd_patchset(files: &[PathBuf], options: &CompactOptions, json: bool) -> anyhow::Result<()> {
    let messages = read_messages(files)?;
    let Some(patchset) = pipeline::patchset_from_messages(messages, options) else {
        if json {
            println!("null");
        } else {
            println!("no patchset");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&patchset)?);
    } else {
        println!("{}", render::render_patchset(&patchset));
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mboxcompact", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
