use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, RecvTimeoutError};

use crate::chart::ChartSpec;

// ---------------------------------------------------------------------------
// Parallel chart conversion
// ---------------------------------------------------------------------------

/// Worker cap for the conversion pool.
pub const MAX_WORKERS: usize = 4;

/// How long the collector waits for the next finished conversion before
/// degrading the remaining charts to their fallback.
pub const CONVERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// One chart after the conversion stage. `converted` is `None` when the
/// conversion failed or timed out; the chart itself is always retained so
/// a renderer can fall back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedChart {
    pub chart: ChartSpec,
    pub converted: Option<String>,
}

/// Convert charts with the default pool size and timeout.
pub fn convert_charts<F>(charts: Vec<ChartSpec>, convert: F) -> Vec<ConvertedChart>
where
    F: Fn(&ChartSpec) -> Result<String> + Send + Sync,
{
    convert_charts_with(charts, convert, MAX_WORKERS, CONVERSION_TIMEOUT)
}

/// Convert every chart through `convert` on a bounded worker pool.
///
/// A conversion that fails or takes longer than `timeout` degrades that
/// one chart to its fallback; it never aborts the batch. The output is in
/// the same order as the input regardless of completion order.
pub fn convert_charts_with<F>(
    charts: Vec<ChartSpec>,
    convert: F,
    workers: usize,
    timeout: Duration,
) -> Vec<ConvertedChart>
where
    F: Fn(&ChartSpec) -> Result<String> + Send + Sync,
{
    let total = charts.len();
    if total == 0 {
        return Vec::new();
    }

    let (job_tx, job_rx) = unbounded::<usize>();
    let (result_tx, result_rx) = unbounded::<(usize, Result<String>)>();
    for i in 0..total {
        let _ = job_tx.send(i);
    }
    drop(job_tx);

    let cancelled = AtomicBool::new(false);
    let mut outputs: Vec<Option<String>> = (0..total).map(|_| None).collect();

    thread::scope(|scope| {
        for _ in 0..workers.max(1).min(total) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let convert = &convert;
            let charts = &charts;
            let cancelled = &cancelled;
            scope.spawn(move || {
                for i in job_rx {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    if result_tx.send((i, convert(&charts[i]))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut received = 0;
        while received < total {
            match result_rx.recv_timeout(timeout) {
                Ok((i, Ok(payload))) => {
                    outputs[i] = Some(payload);
                    received += 1;
                }
                Ok((i, Err(e))) => {
                    log::warn!("conversion failed for chart {}: {e:#}", charts[i].table);
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "conversion timed out; {} charts fall back unconverted",
                        total - received
                    );
                    cancelled.store(true, Ordering::Relaxed);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    charts
        .into_iter()
        .zip(outputs)
        .map(|(chart, converted)| ConvertedChart { chart, converted })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

/// Write the chart set to `path` as a JSON array, converting charts in
/// parallel. Charts whose conversion degraded are embedded from their
/// fallback representation instead. Returns the converted count.
pub fn export_report(path: &Path, charts: &[ChartSpec]) -> Result<usize> {
    let converted = convert_charts(charts.to_vec(), |chart| {
        serde_json::to_string(chart).with_context(|| format!("encoding chart {}", chart.table))
    });

    let mut entries = Vec::with_capacity(converted.len());
    let mut converted_count = 0;
    for item in &converted {
        match &item.converted {
            Some(json) => {
                entries.push(
                    serde_json::from_str::<serde_json::Value>(json)
                        .with_context(|| format!("re-reading converted chart {}", item.chart.table))?,
                );
                converted_count += 1;
            }
            None => entries.push(
                serde_json::to_value(&item.chart)
                    .with_context(|| format!("embedding fallback chart {}", item.chart.table))?,
            ),
        }
    }

    let body = serde_json::to_string_pretty(&entries).context("encoding report")?;
    std::fs::write(path, body).with_context(|| format!("writing report {}", path.display()))?;
    Ok(converted_count)
}
