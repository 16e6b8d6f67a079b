//! Preview binary printing the occurrences a recurrence would generate.
//!
//! Usage: cargo run --bin preview -- --start "1. 1. 2024" --end "22. 1. 2024" --days mon,thu
//!        cargo run --bin preview -- --start 2024-01-01 --end 2024-02-29 --days fri --min-days 21
//!
//! Checks the date range the same way the editor does, then lists the dates
//! of every requested weekday.

mod calendar;
mod config;
mod engine;
mod gate;
mod generator;
mod overrides;
mod schedule;
mod validate;
mod view;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crate::config::AppConfig;
use crate::schedule::{Weekday, WeekdaySelection};

#[derive(Parser, Debug)]
#[command(name = "preview")]
#[command(about = "Print the training dates a weekly recurrence generates")]
struct Args {
    /// First day of the range ("d. m. yyyy" or ISO)
    #[arg(long)]
    start: String,

    /// Last day of the range, inclusive
    #[arg(long)]
    end: String,

    /// Comma-separated weekday codes (mon, tue, wed, thu, fri, sat, sun)
    #[arg(long, value_delimiter = ',')]
    days: Vec<String>,

    /// Minimum range length in days (default: from the config file)
    #[arg(long)]
    min_days: Option<i64>,

    /// Config file to read editor settings from
    #[arg(long, default_value = "trainings.toml")]
    config: PathBuf,
}

fn parse_days(codes: &[String]) -> Result<Vec<Weekday>> {
    codes
        .iter()
        .map(|code| {
            let code = code.trim().to_lowercase();
            match Weekday::from_code(&code) {
                Some(day) => Ok(day),
                None => bail!("unknown weekday '{code}'"),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    let min_days = args.min_days.unwrap_or(config.editor.min_range_days);
    let days = parse_days(&args.days)?;

    let range = match validate::check_date_range(&args.start, &args.end, min_days) {
        Ok(range) => range,
        Err(failure) => bail!("date range rejected: {}", failure.error),
    };
    println!(
        "Date range {} - {} accepted",
        calendar::format_display_date(range.start),
        calendar::format_display_date(range.end)
    );

    let selection = WeekdaySelection::with_days(config.editor.weekday_bound.max(), days);
    if let Err(failure) = validate::check_weekday_selection(&selection, None) {
        println!("Warning: {}", failure.error);
    }

    for weekday in selection.iter() {
        let dates: Vec<String> = generator::generate(weekday, &range)
            .map(calendar::format_display_date)
            .collect();
        println!("{weekday} ({}):", dates.len());
        for date in dates {
            println!("  {date}");
        }
    }

    Ok(())
}
