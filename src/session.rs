use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chart::ChartSpec;

// ---------------------------------------------------------------------------
// SessionStats – derived run summary
// ---------------------------------------------------------------------------

/// Summary of one analysis run, derived entirely from the built charts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub charts_count: usize,
    pub total_data_points: usize,
    /// Chart-kind label → number of charts of that kind.
    pub chart_kinds: BTreeMap<String, usize>,
}

impl SessionStats {
    pub fn from_charts(charts: &[ChartSpec]) -> Self {
        let mut chart_kinds: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_data_points = 0;
        for chart in charts {
            *chart_kinds.entry(chart.kind.label().to_string()).or_insert(0) += 1;
            total_data_points += chart.info.data_points;
        }
        SessionStats {
            charts_count: charts.len(),
            total_data_points,
            chart_kinds,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore – persisted sessions in a side database
// ---------------------------------------------------------------------------

/// One stored session, without its chart payload.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub source_file: String,
    pub created_at: String,
    pub stats: SessionStats,
}

/// Stores analysis sessions in a side SQLite database, charts serialized
/// as a JSON blob per session.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (and if needed initialise) the session database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening session database {}", path.display()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS analysis_sessions (
                 id TEXT PRIMARY KEY,
                 session_name TEXT NOT NULL,
                 source_file TEXT NOT NULL,
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                 charts_count INTEGER NOT NULL,
                 total_data_points INTEGER NOT NULL,
                 chart_kinds TEXT NOT NULL,
                 charts_data TEXT NOT NULL
             )",
        )
        .context("initialising session schema")?;
        Ok(SessionStore { conn })
    }

    /// Persist a session; returns its generated id.
    pub fn save(&self, name: &str, source_file: &str, charts: &[ChartSpec]) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let stats = SessionStats::from_charts(charts);
        let kinds_json =
            serde_json::to_string(&stats.chart_kinds).context("serialising chart kinds")?;
        let charts_json = serde_json::to_string(charts).context("serialising charts")?;

        self.conn
            .execute(
                "INSERT INTO analysis_sessions
                     (id, session_name, source_file, charts_count,
                      total_data_points, chart_kinds, charts_data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    name,
                    source_file,
                    stats.charts_count,
                    stats.total_data_points,
                    kinds_json,
                    charts_json,
                ],
            )
            .context("inserting session")?;
        Ok(id)
    }

    /// All stored sessions, newest first.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, session_name, source_file, created_at,
                        charts_count, total_data_points, chart_kinds
                 FROM analysis_sessions
                 ORDER BY created_at DESC, id",
            )
            .context("listing sessions")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, usize>(4)?,
                    row.get::<_, usize>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .context("reading sessions")?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, name, source_file, created_at, charts_count, total_data_points, kinds_json) =
                row.context("reading session row")?;
            let chart_kinds: BTreeMap<String, usize> = serde_json::from_str(&kinds_json)
                .with_context(|| format!("parsing chart kinds of session {id}"))?;
            sessions.push(SessionSummary {
                id,
                name,
                source_file,
                created_at,
                stats: SessionStats {
                    charts_count,
                    total_data_points,
                    chart_kinds,
                },
            });
        }
        Ok(sessions)
    }

    /// Reload the charts of one session, if it exists.
    pub fn load_charts(&self, id: &str) -> Result<Option<Vec<ChartSpec>>> {
        let charts_json: Option<String> = self
            .conn
            .query_row(
                "SELECT charts_data FROM analysis_sessions WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("loading session {id}"))?;
        match charts_json {
            Some(json) => {
                let charts = serde_json::from_str(&json)
                    .with_context(|| format!("parsing charts of session {id}"))?;
                Ok(Some(charts))
            }
            None => Ok(None),
        }
    }

    /// Delete a session; returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM analysis_sessions WHERE id = ?1", [id])
            .with_context(|| format!("deleting session {id}"))?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartInfo;
    use crate::data::model::ChartKind;

    fn chart(table: &str, kind: ChartKind, data_points: usize) -> ChartSpec {
        ChartSpec {
            table: table.to_string(),
            kind,
            x_title: "x".to_string(),
            y_title: "y".to_string(),
            points: vec![[0.0, 0.0], [1.0, 1.0]],
            info: ChartInfo {
                data_points,
                x_range: [0.0, 1.0],
                y_range: [0.0, 1.0],
                x_mean: 0.5,
                y_mean: 0.5,
            },
        }
    }

    #[test]
    fn stats_count_kinds_and_points() {
        let charts = vec![
            chart("A_Waveform", ChartKind::Waveform, 100),
            chart("A_Spectrum_Hz", ChartKind::SpectrumHz, 10),
            chart("B_Waveform", ChartKind::Waveform, 5),
        ];
        let stats = SessionStats::from_charts(&charts);
        assert_eq!(stats.charts_count, 3);
        assert_eq!(stats.total_data_points, 115);
        assert_eq!(stats.chart_kinds.get("waveform"), Some(&2));
        assert_eq!(stats.chart_kinds.get("spectrum_hz"), Some(&1));
    }

    #[test]
    fn store_round_trips_a_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SessionStore::open(&dir.path().join("sessions.db")).unwrap();

        let charts = vec![chart("A_Waveform", ChartKind::Waveform, 42)];
        let id = store.save("run 1", "demo.db", &charts).unwrap();

        let sessions = store.list().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].name, "run 1");
        assert_eq!(sessions[0].stats.charts_count, 1);
        assert_eq!(sessions[0].stats.total_data_points, 42);

        let loaded = store.load_charts(&id).unwrap().unwrap();
        assert_eq!(loaded, charts);

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.load_charts(&id).unwrap().is_none());
    }
}
