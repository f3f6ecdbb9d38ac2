//! Command handler layer.
//!
//! Owns CLI-oriented orchestration and output wiring; the numeric work lives
//! in `services/*`.
//!
//! ## Files
//! - `analyze.rs` — config resolution, pipeline run, report emission.

pub mod analyze;

pub use analyze::handle_analyze;
