//! Dense linear algebra for the small matrices this tool works with.
//!
//! Graphs here have tens of nodes, so everything is a row-major `Vec<f64>`
//! with straightforward O(n³) routines:
//! - one-sided Jacobi SVD (`svd`)
//! - Moore-Penrose pseudoinverse on top of it (`pseudoinverse`)
//! - eigenvalues of a general real matrix via Hessenberg reduction and
//!   shifted QR (`eigenvalues`)

use serde::ser::{Serialize, SerializeSeq, Serializer};

const MAX_JACOBI_SWEEPS: usize = 100;
const MAX_QR_ITERATIONS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn diagonal(values: &[f64]) -> Self {
        let mut m = Self::zeros(values.len(), values.len());
        for (i, v) in values.iter().enumerate() {
            m.set(i, i, *v);
        }
        m
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    #[cfg(test)]
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for r in rows {
            assert_eq!(r.len(), cols, "ragged matrix rows");
            data.extend_from_slice(r);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.cols + j] = v;
    }

    pub fn add_to(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.cols + j] += v;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j));
            }
        }
        t
    }

    pub fn matmul(&self, other: &Matrix) -> Self {
        assert_eq!(
            self.cols, other.rows,
            "matmul dimension mismatch: {}x{} * {}x{}",
            self.rows, self.cols, other.rows, other.cols
        );
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.add_to(i, j, a * other.get(k, j));
                }
            }
        }
        out
    }

    pub fn sub(&self, other: &Matrix) -> Self {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a - b)
                .collect(),
        }
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    pub fn trace(&self) -> f64 {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).sum()
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    fn column_dot(&self, p: usize, q: usize) -> f64 {
        (0..self.rows).map(|k| self.get(k, p) * self.get(k, q)).sum()
    }

    fn rotate_columns(&mut self, p: usize, q: usize, c: f64, s: f64) {
        for k in 0..self.rows {
            let xp = self.get(k, p);
            let xq = self.get(k, q);
            self.set(k, p, c * xp - s * xq);
            self.set(k, q, s * xp + c * xq);
        }
    }

    fn select_columns(&self, order: &[usize]) -> Self {
        let mut out = Self::zeros(self.rows, order.len());
        for (dst, &src) in order.iter().enumerate() {
            for k in 0..self.rows {
                out.set(k, dst, self.get(k, src));
            }
        }
        out
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for i in 0..self.rows {
            seq.serialize_element(self.row(i))?;
        }
        seq.end()
    }
}

/// Thin SVD `M = U · diag(sigma) · Vᵗ` with singular values sorted descending.
///
/// For an `m x n` input, `u` is `m x k`, `v` is `n x k`, `k = min(m, n)`.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u: Matrix,
    pub sigma: Vec<f64>,
    pub v: Matrix,
}

impl Svd {
    pub fn max_singular_value(&self) -> f64 {
        self.sigma.first().copied().unwrap_or(0.0)
    }

    /// Number of singular values above `tolerance` relative to the largest.
    pub fn rank(&self, tolerance: f64) -> usize {
        let cutoff = tolerance * self.max_singular_value();
        if self.max_singular_value() <= 0.0 {
            return 0;
        }
        self.sigma.iter().filter(|s| **s > cutoff).count()
    }

    /// Sum of `sigma[j] * u_j * v_jᵗ` over the given triplet indices.
    pub fn component(&self, indices: &[usize]) -> Matrix {
        let mut out = Matrix::zeros(self.u.rows(), self.v.rows());
        for &j in indices {
            let s = self.sigma[j];
            for r in 0..self.u.rows() {
                let ur = self.u.get(r, j) * s;
                if ur == 0.0 {
                    continue;
                }
                for c in 0..self.v.rows() {
                    out.add_to(r, c, ur * self.v.get(c, j));
                }
            }
        }
        out
    }
}

pub fn svd(m: &Matrix) -> Svd {
    if m.rows() < m.cols() {
        let t = jacobi_svd(&m.transpose());
        return Svd {
            u: t.v,
            sigma: t.sigma,
            v: t.u,
        };
    }
    jacobi_svd(m)
}

// Hestenes one-sided Jacobi; requires rows >= cols.
fn jacobi_svd(m: &Matrix) -> Svd {
    let n = m.cols();
    let mut u = m.clone();
    let mut v = Matrix::identity(n);

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut rotated = false;
        for p in 0..n {
            for q in (p + 1)..n {
                let alpha = u.column_dot(p, p);
                let beta = u.column_dot(q, q);
                let gamma = u.column_dot(p, q);
                if alpha == 0.0 || beta == 0.0 {
                    continue;
                }
                if gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                u.rotate_columns(p, q, c, s);
                v.rotate_columns(p, q, c, s);
            }
        }
        if !rotated {
            break;
        }
    }

    let mut sigma: Vec<f64> = (0..n).map(|j| u.column_dot(j, j).sqrt()).collect();
    for (j, s) in sigma.iter().enumerate() {
        if *s > 0.0 {
            for k in 0..u.rows() {
                let x = u.get(k, j) / s;
                u.set(k, j, x);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| sigma[*b].total_cmp(&sigma[*a]));
    let u = u.select_columns(&order);
    let v = v.select_columns(&order);
    sigma = order.iter().map(|&j| sigma[j]).collect();

    Svd { u, sigma, v }
}

#[derive(Debug, Clone)]
pub struct Pseudoinverse {
    pub matrix: Matrix,
    pub rank: usize,
    /// Singular values that were non-zero but fell under the cutoff.
    pub discarded: usize,
    /// Singular values that were non-zero at all.
    pub nonzero: usize,
}

/// Moore-Penrose pseudoinverse `A⁺ = V · Σ⁺ · Uᵗ`.
///
/// Singular values at or below `tolerance * sigma_max` are treated as zero.
pub fn pseudoinverse(a: &Matrix, tolerance: f64) -> Pseudoinverse {
    let d = svd(a);
    let cutoff = tolerance * d.max_singular_value();
    let mut pinv = Matrix::zeros(a.cols(), a.rows());
    let mut rank = 0;
    let mut discarded = 0;
    let mut nonzero = 0;

    for (k, &s) in d.sigma.iter().enumerate() {
        if s > 0.0 {
            nonzero += 1;
        }
        if s <= cutoff || s == 0.0 {
            if s > 0.0 {
                discarded += 1;
            }
            continue;
        }
        rank += 1;
        let inv = 1.0 / s;
        for i in 0..a.cols() {
            let vi = d.v.get(i, k) * inv;
            if vi == 0.0 {
                continue;
            }
            for j in 0..a.rows() {
                pinv.add_to(i, j, vi * d.u.get(j, k));
            }
        }
    }

    Pseudoinverse {
        matrix: pinv,
        rank,
        discarded,
        nonzero,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigenvalue {
    pub re: f64,
    pub im: f64,
}

impl Eigenvalue {
    pub fn magnitude(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// All eigenvalues of a square matrix, or `None` if QR iteration fails to
/// converge.
pub fn eigenvalues(m: &Matrix) -> Option<Vec<Eigenvalue>> {
    assert!(m.is_square(), "eigenvalues of a non-square matrix");
    let n = m.rows();
    if n == 0 {
        return Some(Vec::new());
    }

    // 1-based working copy keeps the Hessenberg/QR index arithmetic readable.
    let mut a = vec![vec![0.0_f64; n + 1]; n + 1];
    for i in 0..n {
        for j in 0..n {
            a[i + 1][j + 1] = m.get(i, j);
        }
    }
    reduce_to_hessenberg(&mut a, n);
    hessenberg_qr(&mut a, n)
}

// Similarity reduction by stabilized elementary transformations.
fn reduce_to_hessenberg(a: &mut [Vec<f64>], n: usize) {
    for m in 2..n {
        let mut x = 0.0_f64;
        let mut i = m;
        for j in m..=n {
            if a[j][m - 1].abs() > x.abs() {
                x = a[j][m - 1];
                i = j;
            }
        }
        if i != m {
            for j in (m - 1)..=n {
                let tmp = a[i][j];
                a[i][j] = a[m][j];
                a[m][j] = tmp;
            }
            for row in a.iter_mut().take(n + 1).skip(1) {
                row.swap(i, m);
            }
        }
        if x != 0.0 {
            for i in (m + 1)..=n {
                let mut y = a[i][m - 1];
                if y != 0.0 {
                    y /= x;
                    a[i][m - 1] = y;
                    for j in m..=n {
                        a[i][j] -= y * a[m][j];
                    }
                    for row in a.iter_mut().take(n + 1).skip(1) {
                        row[m] += y * row[i];
                    }
                }
            }
        }
    }
    for i in 1..=n {
        for j in 1..=n {
            if i > j + 1 {
                a[i][j] = 0.0;
            }
        }
    }
}

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

// Francis double-shift QR on an upper Hessenberg matrix.
fn hessenberg_qr(a: &mut [Vec<f64>], n: usize) -> Option<Vec<Eigenvalue>> {
    let mut wr = vec![0.0_f64; n + 1];
    let mut wi = vec![0.0_f64; n + 1];

    let mut anorm = 0.0;
    for i in 1..=n {
        for j in (i.max(2) - 1)..=n {
            anorm += a[i][j].abs();
        }
    }

    let mut nn = n;
    let mut t = 0.0;
    // assigned on every path before first use
    let mut p: f64;
    let mut q: f64;
    let mut r: f64;
    let mut x: f64;
    let mut y: f64;
    let mut z: f64;
    let mut w: f64;
    let mut s: f64;

    while nn >= 1 {
        let mut its = 0;
        loop {
            let mut l = nn;
            while l >= 2 {
                s = a[l - 1][l - 1].abs() + a[l][l].abs();
                if s == 0.0 {
                    s = anorm;
                }
                if a[l][l - 1].abs() + s == s {
                    a[l][l - 1] = 0.0;
                    break;
                }
                l -= 1;
            }

            x = a[nn][nn];
            if l == nn {
                wr[nn] = x + t;
                wi[nn] = 0.0;
                nn -= 1;
            } else {
                y = a[nn - 1][nn - 1];
                w = a[nn][nn - 1] * a[nn - 1][nn];
                if l == nn - 1 {
                    p = 0.5 * (y - x);
                    q = p * p + w;
                    z = q.abs().sqrt();
                    x += t;
                    if q >= 0.0 {
                        z = p + sign(z, p);
                        wr[nn - 1] = x + z;
                        wr[nn] = x + z;
                        if z != 0.0 {
                            wr[nn] = x - w / z;
                        }
                        wi[nn - 1] = 0.0;
                        wi[nn] = 0.0;
                    } else {
                        wr[nn - 1] = x + p;
                        wr[nn] = x + p;
                        wi[nn - 1] = -z;
                        wi[nn] = z;
                    }
                    nn -= 2;
                } else {
                    if its == MAX_QR_ITERATIONS {
                        return None;
                    }
                    if its == 10 || its == 20 {
                        // exceptional shift
                        t += x;
                        for i in 1..=nn {
                            a[i][i] -= x;
                        }
                        s = a[nn][nn - 1].abs() + a[nn - 1][nn - 2].abs();
                        x = 0.75 * s;
                        y = x;
                        w = -0.4375 * s * s;
                    }
                    its += 1;

                    let mut m = nn - 2;
                    loop {
                        z = a[m][m];
                        r = x - z;
                        s = y - z;
                        p = (r * s - w) / a[m + 1][m] + a[m][m + 1];
                        q = a[m + 1][m + 1] - z - r - s;
                        r = a[m + 2][m + 1];
                        s = p.abs() + q.abs() + r.abs();
                        p /= s;
                        q /= s;
                        r /= s;
                        if m == l {
                            break;
                        }
                        let u = a[m][m - 1].abs() * (q.abs() + r.abs());
                        let v = p.abs() * (a[m - 1][m - 1].abs() + z.abs() + a[m + 1][m + 1].abs());
                        if u + v == v {
                            break;
                        }
                        m -= 1;
                    }

                    for i in (m + 2)..=nn {
                        a[i][i - 2] = 0.0;
                        if i != m + 2 {
                            a[i][i - 3] = 0.0;
                        }
                    }

                    for k in m..nn {
                        if k != m {
                            p = a[k][k - 1];
                            q = a[k + 1][k - 1];
                            r = 0.0;
                            if k != nn - 1 {
                                r = a[k + 2][k - 1];
                            }
                            x = p.abs() + q.abs() + r.abs();
                            if x != 0.0 {
                                p /= x;
                                q /= x;
                                r /= x;
                            }
                        }
                        s = sign((p * p + q * q + r * r).sqrt(), p);
                        if s != 0.0 {
                            if k == m {
                                if l != m {
                                    a[k][k - 1] = -a[k][k - 1];
                                }
                            } else {
                                a[k][k - 1] = -s * x;
                            }
                            p += s;
                            x = p / s;
                            y = q / s;
                            z = r / s;
                            q /= p;
                            r /= p;
                            for j in k..=nn {
                                p = a[k][j] + q * a[k + 1][j];
                                if k != nn - 1 {
                                    p += r * a[k + 2][j];
                                    a[k + 2][j] -= p * z;
                                }
                                a[k + 1][j] -= p * y;
                                a[k][j] -= p * x;
                            }
                            let mmin = nn.min(k + 3);
                            for i in l..=mmin {
                                p = x * a[i][k] + y * a[i][k + 1];
                                if k != nn - 1 {
                                    p += z * a[i][k + 2];
                                    a[i][k + 2] -= p * r;
                                }
                                a[i][k + 1] -= p * q;
                                a[i][k] -= p;
                            }
                        }
                    }
                }
            }

            if nn < 2 || l + 1 >= nn {
                break;
            }
        }
    }

    Some(
        (1..=n)
            .map(|i| Eigenvalue {
                re: wr[i],
                im: wi[i],
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted_magnitudes(m: &Matrix) -> Vec<f64> {
        let mut mags: Vec<f64> = eigenvalues(m)
            .expect("qr converges")
            .iter()
            .map(Eigenvalue::magnitude)
            .collect();
        mags.sort_by(|a, b| b.total_cmp(a));
        mags
    }

    #[test]
    fn svd_reconstructs_rectangular_input() {
        let m = Matrix::from_rows(&[
            vec![3.0, 2.0, 2.0],
            vec![2.0, 3.0, -2.0],
        ]);
        let d = svd(&m);
        assert_eq!(d.sigma.len(), 2);
        assert!((d.sigma[0] - 5.0).abs() < 1e-9);
        assert!((d.sigma[1] - 3.0).abs() < 1e-9);
        let back = d.component(&[0, 1]);
        assert!(back.approx_eq(&m, 1e-9));
    }

    #[test]
    fn singular_values_come_out_descending() {
        let m = Matrix::diagonal(&[1.0, 4.0, 2.0]);
        let d = svd(&m);
        assert_eq!(d.sigma, vec![4.0, 2.0, 1.0]);
        assert_eq!(d.rank(1e-10), 3);
    }

    #[test]
    fn pseudoinverse_of_singular_matrix_drops_null_direction() {
        let m = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]);
        let p = pseudoinverse(&m, 1e-10);
        assert_eq!(p.rank, 1);
        let expected = Matrix::from_rows(&[vec![0.25, 0.25], vec![0.25, 0.25]]);
        assert!(p.matrix.approx_eq(&expected, 1e-12));
    }

    #[test]
    fn pseudoinverse_of_zero_matrix_is_zero() {
        let m = Matrix::zeros(3, 3);
        let p = pseudoinverse(&m, 1e-10);
        assert_eq!(p.rank, 0);
        assert_eq!(p.nonzero, 0);
        assert_eq!(p.matrix.max_abs(), 0.0);
    }

    #[test]
    fn eigenvalues_of_triangular_matrix_are_its_diagonal() {
        let m = Matrix::from_rows(&[
            vec![2.0, 1.0, 0.5],
            vec![0.0, -3.0, 4.0],
            vec![0.0, 0.0, 0.5],
        ]);
        let mags = sorted_magnitudes(&m);
        assert!((mags[0] - 3.0).abs() < 1e-9);
        assert!((mags[1] - 2.0).abs() < 1e-9);
        assert!((mags[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rotation_has_complex_pair() {
        let m = Matrix::from_rows(&[vec![0.0, -2.0], vec![2.0, 0.0]]);
        let ev = eigenvalues(&m).expect("qr converges");
        assert_eq!(ev.len(), 2);
        for e in ev {
            assert!(e.re.abs() < 1e-12);
            assert!((e.im.abs() - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn symmetric_four_by_four_eigenvalues() {
        // 0.5 * (J - I) on four nodes: eigenvalues 1.5 and -0.5 (x3)
        let mut m = Matrix::zeros(4, 4);
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    m.set(i, j, 0.5);
                }
            }
        }
        let mags = sorted_magnitudes(&m);
        assert!((mags[0] - 1.5).abs() < 1e-9);
        for v in &mags[1..] {
            assert!((v - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn nilpotent_matrix_has_zero_spectrum() {
        let mut m = Matrix::zeros(4, 4);
        m.set(3, 2, 4.5);
        let mags = sorted_magnitudes(&m);
        assert!(mags[0] < 1e-12);
    }

    fn small_matrix() -> impl Strategy<Value = Matrix> {
        (1usize..6, 1usize..6).prop_flat_map(|(r, c)| {
            prop::collection::vec(-3.0f64..3.0, r * c).prop_map(move |vals| {
                let rows: Vec<Vec<f64>> = vals.chunks(c).map(|ch| ch.to_vec()).collect();
                Matrix::from_rows(&rows)
            })
        })
    }

    proptest! {
        #[test]
        fn pseudoinverse_satisfies_penrose_identity(a in small_matrix()) {
            let p = pseudoinverse(&a, 1e-10);
            let back = a.matmul(&p.matrix).matmul(&a);
            let scale = a.max_abs().max(1.0);
            prop_assert!(back.approx_eq(&a, 1e-8 * scale));
        }
    }
}
