use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use harmonics_viewer::chart::build_chart;
use harmonics_viewer::data::classify::{sorted_table_list, DEFAULT_OMIT};
use harmonics_viewer::data::loader::MeasurementDb;
use harmonics_viewer::data::model::ChartKind;
use harmonics_viewer::data::sanitize::{prepare_dataset, LogSink};
use harmonics_viewer::report;
use harmonics_viewer::session::{SessionStats, SessionStore};

/// Classify, sanitize and chart measurement tables from a SQLite database.
#[derive(Parser)]
#[command(name = "harmonics-viewer", version)]
struct Cli {
    /// Measurement database to analyse
    database: PathBuf,

    /// Additional tables to skip (case-insensitive), on top of the
    /// built-in system tables
    #[arg(long = "omit", value_name = "TABLE")]
    omit: Vec<String>,

    /// Write the prepared charts to a JSON report
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Save the run as a named session
    #[arg(long, value_name = "NAME")]
    save_session: Option<String>,

    /// Session database location
    #[arg(long, value_name = "FILE", default_value = "analysis_sessions.db")]
    session_db: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db = MeasurementDb::open(&cli.database)?;
    let table_names = db.table_names()?;
    info!(
        "found {} tables in {}",
        table_names.len(),
        cli.database.display()
    );

    let mut omit: Vec<String> = DEFAULT_OMIT.iter().map(|n| n.to_string()).collect();
    omit.extend(cli.omit.iter().cloned());

    let ordered = sorted_table_list(&table_names, &omit);

    let mut sink = LogSink;
    let mut charts = Vec::new();
    let mut skipped = 0usize;
    for table in &ordered {
        // Per-table problems are diagnostics; the run keeps going.
        let raw = match db.read_table(table) {
            Ok(ds) => ds,
            Err(e) => {
                warn!("skipping table {table}: {e:#}");
                skipped += 1;
                continue;
            }
        };
        let clean = match prepare_dataset(raw, table, &mut sink) {
            Ok(ds) => ds,
            Err(reason) => {
                warn!("{reason}");
                skipped += 1;
                continue;
            }
        };
        let kind = ChartKind::from_table_name(table);
        match build_chart(&clean, table, kind, &mut sink) {
            Some(built) => charts.push(built),
            None => skipped += 1,
        }
    }

    let stats = SessionStats::from_charts(&charts);
    println!(
        "{} charts prepared, {} tables skipped",
        stats.charts_count, skipped
    );
    for (kind, count) in &stats.chart_kinds {
        println!("  {kind}: {count}");
    }
    println!("  total data points: {}", stats.total_data_points);

    if let Some(out) = &cli.out {
        let converted = report::export_report(out, &charts)?;
        info!(
            "wrote {} charts ({converted} converted) to {}",
            charts.len(),
            out.display()
        );
    }

    if let Some(name) = &cli.save_session {
        let store = SessionStore::open(&cli.session_db)?;
        let source = cli
            .database
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.database.display().to_string());
        let id = store.save(name, &source, &charts)?;
        info!("saved session {name} ({id})");
    }

    Ok(())
}
