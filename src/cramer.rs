//! Closed-form inversion of small symmetric matrices via the adjugate.
//!
//! Sizes 2 and 3 use explicit cofactor formulas; sizes 4 to 6 expand the
//! cofactors by minors. Only the upper triangle of the adjugate is formed,
//! since the adjugate of a symmetric matrix is symmetric. Arithmetic is
//! carried out in `f64`.

use smallvec::SmallVec;

use crate::Element;

/// Largest size handled here.
pub(crate) const MAX_CRAMER: usize = 6;

type Indices = SmallVec<[usize; MAX_CRAMER]>;

/// Invert the symmetric row-major `n x n` matrix in `data` in place.
///
/// Returns the determinant, or `None` (leaving `data` untouched) when it is
/// zero.
pub(crate) fn invert_in_place<T: Element>(data: &mut [T], n: usize) -> Option<f64> {
    debug_assert!((2..=MAX_CRAMER).contains(&n));
    debug_assert_eq!(data.len(), n * n);

    let a: SmallVec<[f64; MAX_CRAMER * MAX_CRAMER]> =
        data.iter().map(|x| x.to_f64_lossy()).collect();

    let (adj, det) = match n {
        2 => adjugate_2x2(&a),
        3 => adjugate_3x3(&a),
        _ => adjugate_by_minors(&a, n),
    };
    if det == 0.0 {
        return None;
    }

    let inv_det = 1.0 / det;
    for i in 0..n {
        for j in i..n {
            let v = T::from_f64_lossy(adj[i * n + j] * inv_det);
            data[i * n + j] = v;
            data[j * n + i] = v;
        }
    }
    Some(det)
}

type Adjugate = SmallVec<[f64; MAX_CRAMER * MAX_CRAMER]>;

fn adjugate_2x2(a: &[f64]) -> (Adjugate, f64) {
    let (a00, a01, a11) = (a[0], a[1], a[3]);
    let det = a00 * a11 - a01 * a01;
    let mut adj = Adjugate::from_elem(0.0, 4);
    adj[0] = a11;
    adj[1] = -a01;
    adj[3] = a00;
    (adj, det)
}

fn adjugate_3x3(a: &[f64]) -> (Adjugate, f64) {
    let (a00, a01, a02) = (a[0], a[1], a[2]);
    let (a11, a12, a22) = (a[4], a[5], a[8]);

    let c00 = a11 * a22 - a12 * a12;
    let c01 = a02 * a12 - a01 * a22;
    let c02 = a01 * a12 - a02 * a11;
    let c11 = a00 * a22 - a02 * a02;
    let c12 = a01 * a02 - a00 * a12;
    let c22 = a00 * a11 - a01 * a01;

    let det = a00 * c00 + a01 * c01 + a02 * c02;
    let mut adj = Adjugate::from_elem(0.0, 9);
    adj[0] = c00;
    adj[1] = c01;
    adj[2] = c02;
    adj[4] = c11;
    adj[5] = c12;
    adj[8] = c22;
    (adj, det)
}

fn adjugate_by_minors(a: &[f64], n: usize) -> (Adjugate, f64) {
    let mut adj = Adjugate::from_elem(0.0, n * n);
    for i in 0..n {
        let rows: Indices = (0..n).filter(|&r| r != i).collect();
        for j in i..n {
            let cols: Indices = (0..n).filter(|&c| c != j).collect();
            let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
            // adj[i][j] = C[j][i] = C[i][j] for symmetric input
            adj[i * n + j] = sign * minor_det(a, n, &rows, &cols);
        }
    }
    // Expansion along the first row.
    let det = (0..n).map(|j| a[j] * adj[j]).sum();
    (adj, det)
}

/// Determinant of the sub-matrix of `a` (`n` columns) on `rows x cols`.
fn minor_det(a: &[f64], n: usize, rows: &[usize], cols: &[usize]) -> f64 {
    debug_assert_eq!(rows.len(), cols.len());
    match rows.len() {
        0 => 1.0,
        1 => a[rows[0] * n + cols[0]],
        2 => {
            let (r0, r1) = (rows[0] * n, rows[1] * n);
            a[r0 + cols[0]] * a[r1 + cols[1]] - a[r0 + cols[1]] * a[r1 + cols[0]]
        }
        _ => {
            let r0 = rows[0] * n;
            let mut det = 0.0;
            let mut sign = 1.0;
            for (k, &c) in cols.iter().enumerate() {
                let v = a[r0 + c];
                if v != 0.0 {
                    let sub: Indices = cols
                        .iter()
                        .enumerate()
                        .filter(|&(m, _)| m != k)
                        .map(|(_, &c)| c)
                        .collect();
                    det += sign * v * minor_det(a, n, &rows[1..], &sub);
                }
                sign = -sign;
            }
            det
        }
    }
}
