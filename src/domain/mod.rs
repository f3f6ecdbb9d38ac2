//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep graph, matrix-result and report structs in one place.
//! - Avoid cyclic imports between pipeline stages.
//! - Make JSON report schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — canonical graph, stage results, hypotheses, report.
//! - `config.rs` — engine thresholds and their defaults.
//! - `error.rs` — fatal error taxonomy and non-fatal diagnostics.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem side effects.
//!
//! ## Compatibility note
//! Changes in these structs affect `--format json` output.
//! Keep schema-impacting changes synchronized with `docs/contracts/*`.

pub mod config;
pub mod error;
pub mod models;
