//! Pure numeric properties of the solved transformation.

use crate::domain::config::PropertyConfig;
use crate::domain::error::{Diagnostic, DiagnosticKind};
use crate::domain::models::MatrixProperties;
use crate::linalg::{eigenvalues, Eigenvalue, Matrix};
use tracing::warn;

const REPORTED_EIGENVALUES: usize = 5;

/// Fraction of entries that are not near-zero relative to the largest entry.
pub fn density(m: &Matrix, zero_fraction: f64) -> f64 {
    let max = m.max_abs();
    if m.is_empty() || max == 0.0 {
        return 0.0;
    }
    let cutoff = zero_fraction * max;
    let significant = m.values().iter().filter(|v| v.abs() > cutoff).count();
    significant as f64 / m.values().len() as f64
}

pub fn sparsity(m: &Matrix, zero_fraction: f64) -> f64 {
    1.0 - density(m, zero_fraction)
}

/// Share of absolute mass sitting on the diagonal; 0 for an all-zero matrix.
pub fn diagonal_share(m: &Matrix) -> f64 {
    let total: f64 = m.values().iter().map(|v| v.abs()).sum();
    if total == 0.0 {
        return 0.0;
    }
    let diag: f64 = (0..m.rows().min(m.cols())).map(|i| m.get(i, i).abs()).sum();
    diag / total
}

pub fn analyze(b: &Matrix, rank: usize, cfg: &PropertyConfig) -> (MatrixProperties, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let frobenius_norm = b.frobenius_norm();
    let has_mass = b.max_abs() > 0.0;

    let (dominant_eigenvalue, eigenvalue_magnitudes) = if b.is_square() && !b.is_empty() {
        match eigenvalues(b) {
            Some(ev) => {
                let floor = cfg.eigen_floor * frobenius_norm;
                let mut mags: Vec<f64> = ev
                    .iter()
                    .map(Eigenvalue::magnitude)
                    .map(|m| if m <= floor { 0.0 } else { m })
                    .collect();
                mags.sort_by(|a, b| b.total_cmp(a));
                let dominant = mags.first().copied();
                mags.truncate(REPORTED_EIGENVALUES);
                (dominant, mags)
            }
            None => {
                let msg = "eigenvalue iteration did not converge; dominant eigenvalue unavailable";
                warn!("{}", msg);
                diagnostics.push(Diagnostic::new(DiagnosticKind::EigenvalueNonConvergence, msg));
                (None, Vec::new())
            }
        }
    } else {
        (None, Vec::new())
    };

    let props = MatrixProperties {
        rank,
        full_rank: !b.is_empty() && rank == b.rows().min(b.cols()),
        sparsity: sparsity(b, cfg.zero_fraction),
        is_diagonal: has_mass && 1.0 - diagonal_share(b) < cfg.diagonal_tolerance,
        is_identity: b.is_square()
            && !b.is_empty()
            && b.approx_eq(&Matrix::identity(b.rows()), cfg.identity_tolerance),
        dominant_eigenvalue,
        eigenvalue_magnitudes,
        trace: b.trace(),
        frobenius_norm,
    };
    (props, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PropertyConfig {
        PropertyConfig::default()
    }

    #[test]
    fn identity_is_diagonal_full_rank_unit_spectrum() {
        let (p, diags) = analyze(&Matrix::identity(3), 3, &cfg());
        assert!(diags.is_empty());
        assert!(p.is_identity);
        assert!(p.is_diagonal);
        assert!(p.full_rank);
        assert!((p.sparsity - 6.0 / 9.0).abs() < 1e-12);
        assert!((p.dominant_eigenvalue.expect("square") - 1.0).abs() < 1e-12);
        assert_eq!(p.trace, 3.0);
    }

    #[test]
    fn identity_tolerance_is_configurable() {
        let near = Matrix::diagonal(&[1.0, 1.0 + 1e-4]);
        let (strict, _) = analyze(&near, 2, &cfg());
        assert!(!strict.is_identity);

        let loose = PropertyConfig {
            identity_tolerance: 1e-3,
            ..cfg()
        };
        let (p, _) = analyze(&near, 2, &loose);
        assert!(p.is_identity);
    }

    #[test]
    fn near_zero_entries_count_as_sparse() {
        let mut m = Matrix::zeros(4, 4);
        m.set(3, 2, 4.5);
        m.set(3, 0, 1e-15);
        let (p, _) = analyze(&m, 1, &cfg());
        assert!((p.sparsity - 15.0 / 16.0).abs() < 1e-12);
        assert!(!p.is_diagonal);
        assert!(!p.full_rank);
        assert_eq!(p.dominant_eigenvalue, Some(0.0));
    }

    #[test]
    fn small_off_diagonal_leak_still_diagonal() {
        let m = Matrix::from_rows(&[vec![2.0, 0.01], vec![0.0, 3.0]]);
        let (p, _) = analyze(&m, 2, &cfg());
        assert!(p.is_diagonal);
        assert!(!p.is_identity);

        let dense = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]);
        let (p, _) = analyze(&dense, 1, &cfg());
        assert!(!p.is_diagonal);
        assert_eq!(p.sparsity, 0.0);
    }

    #[test]
    fn zero_matrix_is_fully_sparse_but_not_diagonal() {
        let (p, _) = analyze(&Matrix::zeros(3, 3), 0, &cfg());
        assert_eq!(p.sparsity, 1.0);
        assert!(!p.is_diagonal);
        assert!(!p.full_rank);
        assert_eq!(p.dominant_eigenvalue, Some(0.0));
    }

    #[test]
    fn amplifying_spectrum_is_reported_descending() {
        let m = Matrix::from_rows(&[
            vec![2.0, 1.0, 0.0],
            vec![1.0, 2.0, 0.0],
            vec![0.0, 0.0, 0.5],
        ]);
        let (p, _) = analyze(&m, 3, &cfg());
        let dom = p.dominant_eigenvalue.expect("square");
        assert!((dom - 3.0).abs() < 1e-9);
        assert_eq!(p.eigenvalue_magnitudes.len(), 3);
        assert!((p.eigenvalue_magnitudes[1] - 1.0).abs() < 1e-9);
        assert!((p.eigenvalue_magnitudes[2] - 0.5).abs() < 1e-9);
        assert!(p
            .eigenvalue_magnitudes
            .windows(2)
            .all(|w| w[0] >= w[1] - 1e-12));
    }

    #[test]
    fn rectangular_matrix_has_no_eigenvalues() {
        let m = Matrix::from_rows(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
        let (p, _) = analyze(&m, 2, &cfg());
        assert_eq!(p.dominant_eigenvalue, None);
        assert!(p.full_rank);
        assert!(!p.is_identity);
    }

    #[test]
    fn diagonal_share_of_mixed_matrix() {
        let m = Matrix::from_rows(&[vec![3.0, -1.0], vec![0.0, 1.0]]);
        assert!((diagonal_share(&m) - 0.8).abs() < 1e-12);
        assert_eq!(diagonal_share(&Matrix::zeros(2, 2)), 0.0);
    }
}
