use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use super::model::{CellValue, Dataset, VALUE_X, VALUE_Y};

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Receiver for human-readable messages about corrective actions taken
/// while preparing a table. Keeps the pipeline decoupled from any
/// particular output destination.
pub trait DiagnosticSink {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// Default sink: forward everything to the `log` crate.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
    }
}

/// Why a table was excluded from the chart set. Per-table only; none of
/// these aborts processing of the remaining tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("table {table} is empty initially")]
    EmptyInput { table: String },

    #[error("table {table} is missing required columns: {missing} (available: {available})")]
    MissingColumns {
        table: String,
        missing: String,
        available: String,
    },

    #[error("table {table} is empty after dropping non-numeric rows")]
    EmptyAfterCoercion { table: String },

    #[error("table {table} became empty after removing negative values")]
    EmptyAfterSpectrumFilter { table: String },
}

// ---------------------------------------------------------------------------
// Sanitizer pipeline
// ---------------------------------------------------------------------------

/// Tables larger than this are downsampled before charting.
pub const MAX_POINTS: usize = 10_000;

/// Fixed seed for the downsampling RNG, so repeated runs over identical
/// input pick identical rows.
pub const SAMPLE_SEED: u64 = 42;

/// Turn a raw table into a chart-ready dataset, or report why it must be
/// skipped.
///
/// Steps, in order: reject empty input; require the `ValueX`/`ValueY`
/// columns; coerce both to numeric and drop rows where either is missing;
/// reject if nothing survives; warn on a single remaining point; for
/// spectrum tables drop negative-X rows; downsample to [`MAX_POINTS`] with
/// a seeded uniform sample and re-sort ascending by X.
///
/// Running the function on its own output changes nothing further.
pub fn prepare_dataset(
    mut ds: Dataset,
    table_name: &str,
    sink: &mut dyn DiagnosticSink,
) -> Result<Dataset, SkipReason> {
    if ds.is_empty() {
        return Err(SkipReason::EmptyInput {
            table: table_name.to_string(),
        });
    }

    let (Some(xi), Some(yi)) = (ds.column_index(VALUE_X), ds.column_index(VALUE_Y)) else {
        let missing: Vec<&str> = [VALUE_X, VALUE_Y]
            .into_iter()
            .filter(|col| ds.column_index(col).is_none())
            .collect();
        return Err(SkipReason::MissingColumns {
            table: table_name.to_string(),
            missing: missing.join(", "),
            available: ds.columns.join(", "),
        });
    };

    // Coerce X/Y to numeric; a row where either cell fails is dropped.
    let mut coerced = Vec::with_capacity(ds.rows.len());
    for mut row in ds.rows {
        if let (Some(x), Some(y)) = (row[xi].coerce_f64(), row[yi].coerce_f64()) {
            row[xi] = CellValue::Float(x);
            row[yi] = CellValue::Float(y);
            coerced.push(row);
        }
    }
    ds.rows = coerced;

    if ds.is_empty() {
        return Err(SkipReason::EmptyAfterCoercion {
            table: table_name.to_string(),
        });
    }
    if ds.len() == 1 {
        sink.warn(&format!(
            "table {table_name} has only 1 data point; plot may not be meaningful"
        ));
    }

    // Spectra have no meaningful negative frequencies/orders.
    if table_name.to_lowercase().contains("spectrum") {
        let before = ds.len();
        ds.rows
            .retain(|row| row[xi].as_f64().is_some_and(|x| x >= 0.0));
        if ds.is_empty() {
            return Err(SkipReason::EmptyAfterSpectrumFilter {
                table: table_name.to_string(),
            });
        }
        let removed = before - ds.len();
        if removed > 0 {
            sink.info(&format!(
                "removed {removed} negative ValueX values from {table_name}"
            ));
        }
    }

    if ds.len() > MAX_POINTS {
        sink.info(&format!(
            "sampling {MAX_POINTS} points from {} total points in {table_name}",
            ds.len()
        ));
        let mut rng = ChaCha8Rng::seed_from_u64(SAMPLE_SEED);
        let mut picked = rand::seq::index::sample(&mut rng, ds.len(), MAX_POINTS).into_vec();
        picked.sort_unstable();

        let mut keep = vec![false; ds.len()];
        for i in picked {
            keep[i] = true;
        }
        let mut idx = 0;
        ds.rows.retain(|_| {
            let kept = keep[idx];
            idx += 1;
            kept
        });

        ds.rows.sort_by(|a, b| {
            let ax = a[xi].as_f64().unwrap_or(f64::NAN);
            let bx = b[xi].as_f64().unwrap_or(f64::NAN);
            ax.total_cmp(&bx)
        });
    }

    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that buffers messages for assertions.
    #[derive(Default)]
    struct BufferSink {
        infos: Vec<String>,
        warnings: Vec<String>,
    }

    impl DiagnosticSink for BufferSink {
        fn info(&mut self, message: &str) {
            self.infos.push(message.to_string());
        }

        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    fn xy_dataset(pairs: &[(f64, f64)]) -> Dataset {
        let mut ds = Dataset::new(vec![VALUE_X.into(), VALUE_Y.into()]);
        for &(x, y) in pairs {
            ds.rows.push(vec![CellValue::Float(x), CellValue::Float(y)]);
        }
        ds
    }

    #[test]
    fn empty_input_is_skipped() {
        let mut sink = BufferSink::default();
        let result = prepare_dataset(xy_dataset(&[]), "T", &mut sink);
        assert_eq!(
            result,
            Err(SkipReason::EmptyInput {
                table: "T".to_string()
            })
        );
    }

    #[test]
    fn missing_value_y_is_invalid_regardless_of_rows() {
        let mut ds = Dataset::new(vec![VALUE_X.into(), "Phase".into()]);
        for i in 0..50 {
            ds.rows
                .push(vec![CellValue::Float(i as f64), CellValue::Float(0.0)]);
        }
        let mut sink = BufferSink::default();
        match prepare_dataset(ds, "T", &mut sink) {
            Err(SkipReason::MissingColumns {
                missing, available, ..
            }) => {
                assert_eq!(missing, "ValueY");
                assert_eq!(available, "ValueX, Phase");
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_rows_are_dropped() {
        let mut ds = Dataset::new(vec![VALUE_X.into(), VALUE_Y.into()]);
        ds.rows
            .push(vec![CellValue::String("1.5".into()), CellValue::Integer(2)]);
        ds.rows
            .push(vec![CellValue::String("oops".into()), CellValue::Float(3.0)]);
        ds.rows.push(vec![CellValue::Null, CellValue::Float(4.0)]);

        let mut sink = BufferSink::default();
        let out = prepare_dataset(ds, "T", &mut sink).unwrap();
        assert_eq!(out.xy_points(), vec![(1.5, 2.0)]);
    }

    #[test]
    fn all_rows_unparseable_is_skipped() {
        let mut ds = Dataset::new(vec![VALUE_X.into(), VALUE_Y.into()]);
        ds.rows
            .push(vec![CellValue::String("a".into()), CellValue::Float(1.0)]);
        let mut sink = BufferSink::default();
        assert_eq!(
            prepare_dataset(ds, "T", &mut sink),
            Err(SkipReason::EmptyAfterCoercion {
                table: "T".to_string()
            })
        );
    }

    #[test]
    fn single_point_warns_but_stays_valid() {
        let mut sink = BufferSink::default();
        let out = prepare_dataset(xy_dataset(&[(1.0, 2.0)]), "T", &mut sink).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(sink.warnings.len(), 1);
        assert!(sink.warnings[0].contains("only 1 data point"));
    }

    #[test]
    fn spectrum_tables_drop_negative_x() {
        let mut sink = BufferSink::default();
        let out = prepare_dataset(
            xy_dataset(&[(-5.0, 1.0), (10.0, 2.0)]),
            "X_Spectrum_Hz",
            &mut sink,
        )
        .unwrap();
        assert_eq!(out.xy_points(), vec![(10.0, 2.0)]);
        assert!(sink.infos.iter().any(|m| m.contains("1 negative")));
    }

    #[test]
    fn spectrum_filter_emptying_dataset_is_skipped() {
        let mut sink = BufferSink::default();
        assert_eq!(
            prepare_dataset(xy_dataset(&[(-5.0, 1.0)]), "X_Spectrum_Hz", &mut sink),
            Err(SkipReason::EmptyAfterSpectrumFilter {
                table: "X_Spectrum_Hz".to_string()
            })
        );
    }

    #[test]
    fn non_spectrum_tables_keep_negative_x() {
        let mut sink = BufferSink::default();
        let out = prepare_dataset(
            xy_dataset(&[(-5.0, 1.0), (10.0, 2.0)]),
            "X_Waveform",
            &mut sink,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn oversized_dataset_is_downsampled_sorted_and_reproducible() {
        // Descending X so the re-sort is observable.
        let pairs: Vec<(f64, f64)> = (0..12_000).map(|i| ((12_000 - i) as f64, 0.5)).collect();

        let mut sink = BufferSink::default();
        let first = prepare_dataset(xy_dataset(&pairs), "Big_Waveform", &mut sink).unwrap();
        assert_eq!(first.len(), MAX_POINTS);
        assert!(sink
            .infos
            .iter()
            .any(|m| m.contains("sampling 10000 points from 12000")));

        let xs: Vec<f64> = first.xy_points().iter().map(|&(x, _)| x).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));

        let mut sink = BufferSink::default();
        let second = prepare_dataset(xy_dataset(&pairs), "Big_Waveform", &mut sink).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sanitizing_is_idempotent() {
        let pairs: Vec<(f64, f64)> = (0..12_000).map(|i| (i as f64, (i % 7) as f64)).collect();
        let mut sink = BufferSink::default();
        let once = prepare_dataset(xy_dataset(&pairs), "Big_Spectrum_Hz", &mut sink).unwrap();

        let mut sink = BufferSink::default();
        let twice = prepare_dataset(once.clone(), "Big_Spectrum_Hz", &mut sink).unwrap();
        assert_eq!(once, twice);
        assert!(sink.infos.is_empty());
        assert!(sink.warnings.is_empty());
    }
}
