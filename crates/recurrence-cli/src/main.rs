use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use recurrence_engine::{
    format_instant, parse_instant, CalculatorLimits, RecurrenceCalculator, RecurrencePattern,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recur")]
#[command(version, about = "Compute occurrences of recurrence patterns", long_about = None)]
struct Cli {
    /// Print results as a JSON array instead of one instant per line
    #[arg(long, global = true)]
    json: bool,

    /// How many interval steps a monthly search may take
    #[arg(long, global = true)]
    max_month_steps: Option<u32>,

    /// How many occurrences a single range walk may produce
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the next occurrences strictly after an instant
    Next {
        /// Pattern as inline JSON, @path to a JSON file, or - for stdin
        #[arg(short, long)]
        pattern: String,

        /// Reference instant (YYYY-MM-DDTHH:MM[:SS], RFC 3339, or YYYY-MM-DD)
        #[arg(long, value_parser = parse_datetime)]
        after: NaiveDateTime,

        /// How many successive occurrences to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Print every occurrence between two instants
    Range {
        /// Pattern as inline JSON, @path to a JSON file, or - for stdin
        #[arg(short, long)]
        pattern: String,

        /// Window start (exclusive)
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,

        /// Window end (inclusive)
        #[arg(long, value_parser = parse_datetime)]
        end: NaiveDateTime,

        /// Stop after this many occurrences
        #[arg(long, default_value_t = 100)]
        max_count: usize,
    },

    /// Check a pattern and print its normalized record
    Validate {
        /// Pattern as inline JSON, @path to a JSON file, or - for stdin
        #[arg(short, long)]
        pattern: String,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let calculator = RecurrenceCalculator::with_limits(limits(&cli));

    match cli.command {
        Command::Next {
            pattern,
            after,
            count,
        } => {
            let pattern = read_pattern(&pattern)?;
            debug!(frequency = %pattern.frequency(), %after, count, "next");

            let occurrences: Vec<_> = std::iter::successors(
                calculator.next_occurrence(&pattern, after),
                |prev| calculator.next_occurrence(&pattern, *prev),
            )
            .take(count)
            .collect();
            print_instants(&occurrences, cli.json)?;
        }
        Command::Range {
            pattern,
            start,
            end,
            max_count,
        } => {
            let pattern = read_pattern(&pattern)?;
            debug!(frequency = %pattern.frequency(), %start, %end, max_count, "range");

            let occurrences: Vec<_> = calculator
                .occurrences_in_range(&pattern, start, end, max_count)
                .collect();
            print_instants(&occurrences, cli.json)?;
        }
        Command::Validate { pattern } => {
            let record = read_pattern(&pattern)?.to_record();
            let output = if cli.json {
                serde_json::to_string(&record)?
            } else {
                serde_json::to_string_pretty(&record)?
            };
            println!("{output}");
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn limits(cli: &Cli) -> CalculatorLimits {
    let defaults = CalculatorLimits::default();
    CalculatorLimits {
        max_month_steps: cli.max_month_steps.unwrap_or(defaults.max_month_steps),
        max_iterations: cli.max_iterations.unwrap_or(defaults.max_iterations),
    }
}

fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_instant(s).ok_or_else(|| format!("invalid datetime: '{s}'"))
}

fn read_pattern(source: &str) -> Result<RecurrencePattern> {
    let json = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read pattern from stdin")?;
        buf
    } else if let Some(path) = source.strip_prefix('@') {
        fs::read_to_string(path).with_context(|| format!("Failed to read pattern file: {path}"))?
    } else {
        source.to_string()
    };

    RecurrencePattern::from_json(&json).context("Invalid recurrence pattern")
}

fn print_instants(instants: &[NaiveDateTime], json: bool) -> Result<()> {
    if json {
        let formatted: Vec<String> = instants.iter().map(format_instant).collect();
        println!("{}", serde_json::to_string(&formatted)?);
    } else {
        for instant in instants {
            println!("{}", format_instant(instant));
        }
    }
    Ok(())
}
