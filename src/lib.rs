//! Measurement-database triage and chart preparation.
//!
//! Pipeline: enumerate the tables of a SQLite measurement database, order
//! them deterministically ([`data::classify`]), sanitize each table's rows
//! ([`data::sanitize`]), pick a chart kind per table name
//! ([`data::model::ChartKind`]), build renderer-agnostic chart
//! descriptions ([`chart`]), and summarize or export the result
//! ([`session`], [`report`]).

pub mod chart;
pub mod data;
pub mod report;
pub mod session;
