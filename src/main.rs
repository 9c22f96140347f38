//! layerlog - console inspector for buffer snapshots
//!
//! Loads a snapshot written by `LogBuffer::save_to_disk` and prints its
//! messages in the requested order.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;

use layerlog::logging::{self, Level, LogBuffer, SortBy};

const USAGE: &str = "usage: layerlog <snapshot> [--sort time|level|call-site] [--min-level LEVEL]";

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    path: PathBuf,
    sort: SortBy,
    min_level: Level,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut path = None;
    let mut sort = SortBy::Time;
    let mut min_level = Level::Debug;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sort" => {
                let value = iter.next().context("--sort needs a value")?;
                sort = value.parse()?;
            }
            "--min-level" => {
                let value = iter.next().context("--min-level needs a value")?;
                min_level = value.parse()?;
            }
            "-h" | "--help" => bail!(USAGE),
            other if other.starts_with('-') => bail!("unknown option '{}'\n{}", other, USAGE),
            other => {
                if path.replace(PathBuf::from(other)).is_some() {
                    bail!("only one snapshot path may be given\n{}", USAGE);
                }
            }
        }
    }

    let path = path.context(USAGE)?;
    Ok(Args {
        path,
        sort,
        min_level,
    })
}

fn render(buffer: &LogBuffer, args: &Args) -> Vec<String> {
    let capacity = match buffer.max_capacity() {
        0 => "unbounded".to_string(),
        n => n.to_string(),
    };
    let mut lines = vec![format!(
        "{} ({} messages, capacity {}, dedup {}, sorted by {})",
        buffer.name(),
        buffer.len(),
        capacity,
        if buffer.dedup() { "on" } else { "off" },
        args.sort
    )];

    lines.extend(
        buffer
            .sorted_by(args.sort)
            .iter()
            .filter(|m| m.level() >= args.min_level)
            .map(|m| {
                format!(
                    "{} {}  {:<8}  {}  {}",
                    if m.level().is_alert() { '!' } else { ' ' },
                    m.timestamp()
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S%.3f"),
                    m.level(),
                    m.call_site(),
                    m.content()
                )
            }),
    );
    lines
}

fn main() -> Result<()> {
    logging::init_console_logging(logging::DEFAULT_DIRECTIVE)?;

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let buffer = LogBuffer::load_from_disk(&args.path)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Failed to load snapshot {}", args.path.display()))?;

    tracing::debug!("Rendering {} messages", buffer.len());
    for line in render(&buffer, &args) {
        println!("{}", line);
    }

    Ok(())
}
