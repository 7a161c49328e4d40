//! Data layer: core types, database access, classification, sanitizing.
//!
//! Architecture:
//! ```text
//!   measurement .db (SQLite)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read tables → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ classify  │  order table names by prefix + kind
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ sanitize  │  validate, coerce, filter, downsample
//!   └──────────┘
//! ```

pub mod classify;
pub mod loader;
pub mod model;
pub mod sanitize;
