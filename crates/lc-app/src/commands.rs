//! Subcommand implementations

use anyhow::{anyhow, Context, Result};

use lc_analysis::{
    extract_series_by_name, find_state_column, segment_states, StateCatalog, ValueQuery,
};
use lc_data::{LogFile, LogFileEngine};

use crate::Command;

pub fn run(engine: &LogFileEngine, command: &Command) -> Result<()> {
    let log = engine.log()?;
    match command {
        Command::Info => info(log),
        Command::Cell { row, col } => cell(log, *row, *col),
        Command::Series { column, from, to } => series(log, column, *from, *to),
        Command::States { column, catalog } => states(log, column.as_deref(), catalog.as_deref()),
        Command::Find { column, query, from } => find(log, column, query, *from),
    }
}

fn info(log: &LogFile) -> Result<()> {
    let detection = log.detection();
    println!("File:        {}", log.path().display());
    println!("Size:        {} bytes", log.byte_len());
    println!("Rows:        {}", log.total_rows());
    println!("Format:      {:?}", detection.format);
    println!("Signal:      {:?}", detection.signal);
    if detection.is_fallback() {
        println!("             (no header signal matched; layout assumed)");
    }
    println!("Data starts: row {}", log.data_start_row());
    println!("Columns:     {}", log.column_count());

    for (idx, (display, raw)) in log
        .column_names()
        .iter()
        .zip(log.raw_column_names())
        .enumerate()
    {
        if display == raw {
            println!("  {idx:>4}  {display}");
        } else {
            println!("  {idx:>4}  {display}  ({raw})");
        }
    }
    Ok(())
}

fn cell(log: &LogFile, row: usize, col: usize) -> Result<()> {
    println!("text:  {:?}", log.string_at(row, col));
    match log.cell_value(row, col) {
        Some(value) => println!("value: {value}"),
        None => println!("value: NaN"),
    }
    Ok(())
}

fn series(log: &LogFile, column: &str, from: Option<usize>, to: Option<usize>) -> Result<()> {
    let series = extract_series_by_name(log, column)?;
    let start = from.unwrap_or(log.data_start_row()).min(series.len());
    let end = to.unwrap_or(series.len()).clamp(start, series.len());

    for row in start..end {
        let value = series.data[row];
        if value.is_nan() {
            println!("{row}\t{}\tNaN", log.string_at(row, 0));
        } else {
            println!("{row}\t{}\t{value:.2}", log.string_at(row, 0));
        }
    }

    if let Some(stats) = series.stats(start..end) {
        eprintln!(
            "{}: n={} min={:.2} max={:.2} mean={:.2} delta={:.2}",
            series.name,
            stats.count,
            stats.min,
            stats.max,
            stats.mean,
            stats.delta()
        );
    }
    Ok(())
}

fn states(log: &LogFile, column: Option<&str>, catalog: Option<&std::path::Path>) -> Result<()> {
    let col = match column {
        Some(name) => log
            .column_index(name)
            .ok_or_else(|| anyhow!("Unknown column: {name}"))?,
        None => find_state_column(log.column_names())
            .ok_or_else(|| anyhow!("No state column found; pass --column"))?,
    };

    let catalog = match catalog {
        Some(path) => StateCatalog::from_json_file(path)
            .with_context(|| format!("Failed to read state catalog {}", path.display()))?,
        None => StateCatalog::default(),
    };

    let timeline = segment_states(log, col, &catalog);
    for event in &timeline.events {
        println!("{}\t{}\t{}", event.row, event.time, event.state_name);
    }
    if timeline.events_truncated {
        eprintln!(
            "{} state changes; only the first {} are listed",
            timeline.intervals.len(),
            timeline.events.len()
        );
    }
    Ok(())
}

fn find(log: &LogFile, column: &str, query: &str, from: usize) -> Result<()> {
    let query = ValueQuery::parse(query)?;
    let series = extract_series_by_name(log, column)?;

    match series.find_first(&query, from) {
        Some(row) => println!("{row}\t{}\t{}", log.string_at(row, 0), series.data[row]),
        None => println!("Value not found."),
    }
    Ok(())
}
