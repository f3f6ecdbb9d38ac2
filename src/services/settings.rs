use crate::domain::config::EngineConfig;
use crate::domain::error::InferenceError;
use std::path::Path;
use tracing::debug;

/// Reads engine thresholds from a TOML file, or the defaults when no file
/// was given. The result is always validated.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, InferenceError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    if !path.exists() {
        return Err(InferenceError::FileNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: EngineConfig = toml::from_str(&raw)
        .map_err(|e| InferenceError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    cfg.validate()?;
    debug!(path = %path.display(), "loaded engine config");
    Ok(cfg)
}

/// Applies command-line overrides on top of a loaded config.
pub fn apply_overrides(
    mut cfg: EngineConfig,
    tolerance: Option<f64>,
    gap_threshold: Option<f64>,
) -> Result<EngineConfig, InferenceError> {
    if let Some(t) = tolerance {
        cfg.solver.pinv_tolerance = t;
    }
    if let Some(g) = gap_threshold {
        cfg.decomposition.gap_threshold = g;
    }
    cfg.validate()?;
    Ok(cfg)
}
