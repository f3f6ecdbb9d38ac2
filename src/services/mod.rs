//! Service layer containing the inference pipeline and its side-effect helpers.
//!
//! ## Service map
//! - `loader.rs` — JSON format detection and normalization to `CanonicalGraph`.
//! - `matrix.rs` — aligned adjacency matrices over the node union.
//! - `solver.rs` — `B = C · A⁺`, reconstruction error, solver confidence.
//! - `decompose.rs` — SVD layer split and per-layer factors.
//! - `properties.rs` — rank/sparsity/diagonality/spectrum of B.
//! - `hypotheses.rs` — ordered rule table from properties to hypotheses.
//! - `pipeline.rs` — stage wiring into an `AnalysisReport`.
//! - `settings.rs` — TOML config loading and CLI overrides.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Stages are pure functions of their inputs; only `loader`, `settings`
//!   and `output` touch the filesystem.
//! - Non-fatal findings become `Diagnostic`s, not errors.
//! - Keep command handlers thin; delegate to services.

pub mod decompose;
pub mod hypotheses;
pub mod loader;
pub mod matrix;
pub mod output;
pub mod pipeline;
pub mod properties;
pub mod settings;
pub mod solver;
