//! Eigenvalues and eigenvectors of an upper Hessenberg matrix.
//!
//! The matrix is driven to real Schur form with Francis' implicit double-shift QR iteration,
//! deflating one real root or a 2x2 block at a time from the bottom. Eigenvectors are found by
//! back-substitution in the quasi-triangular Schur form and mapped back through the accumulated
//! transform.
//!
//! Derived from the Algol procedure hqr2 by Martin and Wilkinson (Handbook for Automatic
//! Computation, Vol. II, Linear Algebra) and the corresponding EISPACK routine.

use num_complex::Complex64;

use super::hessenberg::Hessenberg;
use crate::{
    error::{MatrixError, Result},
    matrix::Matrix,
};

const EPS: f64 = f64::EPSILON;

pub struct SchurSolution {
    /// A conjugate pair is stored positive imaginary part first.
    pub eigenvalues: Vec<Complex64>,
    /// For a pair at `(k, k + 1)`, column `k` is the real part and column `k + 1` the imaginary
    /// part of the eigenvector for `eigenvalues[k]`.
    pub eigenvectors: Matrix,
}

pub fn solve(hessenberg: Hessenberg, max_iterations: usize) -> Result<SchurSolution> {
    puffin::profile_function!();
    let Hessenberg {
        matrix: mut a,
        transform: mut z,
        ..
    } = hessenberg;
    let n = a.rows();
    let mut wr = vec![0.0; n];
    let mut wi = vec![0.0; n];

    let norm = matrix_norm(&a);
    if n > 0 {
        let iterations = {
            puffin::profile_scope!("qr_iteration");
            find_eigenvalues(&mut a, &mut z, &mut wr, &mut wi, norm, max_iterations)?
        };
        log::debug!("schur: {n}x{n} matrix reduced after {iterations} QR iterations");
    }
    if norm != 0.0 {
        puffin::profile_scope!("back_substitution");
        back_substitute(&mut a, &wr, &wi, norm);
        back_transform(&a, &mut z);
    }

    Ok(SchurSolution {
        eigenvalues: wr
            .into_iter()
            .zip(wi)
            .map(|(re, im)| Complex64::new(re, im))
            .collect(),
        eigenvectors: z,
    })
}

/// Sum of absolute values on and above the first sub-diagonal.
fn matrix_norm(a: &Matrix) -> f64 {
    let n = a.rows();
    let mut norm = 0.0;
    for i in 0..n {
        for j in i.saturating_sub(1)..n {
            norm += a[(i, j)].abs();
        }
    }
    norm
}

/// `|a|` with the sign of `b`, where zero counts as positive.
#[inline]
fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Complex scalar division `(xr + i·xi) / (yr + i·yi)`.
fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

/// QR iteration until every eigenvalue has deflated. Returns the total iteration count.
///
/// On return `a` is in real Schur form (up to the eigenvector back-substitution) and `z` holds the
/// accumulated orthogonal-like transform.
fn find_eigenvalues(
    a: &mut Matrix,
    z: &mut Matrix,
    wr: &mut [f64],
    wi: &mut [f64],
    norm: f64,
    max_iterations: usize,
) -> Result<usize> {
    let n = a.rows();
    let mut nn = n - 1;
    // Accumulated exceptional shifts.
    let mut t = 0.0;
    let mut total = 0;

    'deflation: loop {
        let mut its = 0;
        loop {
            // Look for a single small sub-diagonal element.
            let mut l = nn;
            while l > 0 {
                let mut s = a[(l - 1, l - 1)].abs() + a[(l, l)].abs();
                if s == 0.0 {
                    s = norm;
                }
                if a[(l, l - 1)].abs() <= EPS * s {
                    a[(l, l - 1)] = 0.0;
                    break;
                }
                l -= 1;
            }

            let x = a[(nn, nn)];
            if l == nn {
                // One root.
                a[(nn, nn)] = x + t;
                wr[nn] = x + t;
                wi[nn] = 0.0;
                log::trace!("schur: real eigenvalue {} at {nn} after {its} iterations", wr[nn]);
                if nn == 0 {
                    break 'deflation;
                }
                nn -= 1;
                continue 'deflation;
            }

            if l + 1 == nn {
                // Two roots.
                deflate_pair(a, z, wr, wi, nn, t);
                log::trace!("schur: eigenvalue pair at {}..={nn} after {its} iterations", nn - 1);
                if nn < 2 {
                    break 'deflation;
                }
                nn -= 2;
                continue 'deflation;
            }

            let y = a[(nn - 1, nn - 1)];
            let w = a[(nn, nn - 1)] * a[(nn - 1, nn)];
            if its == max_iterations {
                return Err(MatrixError::NonConvergence {
                    iterations: its,
                    index: nn,
                });
            }
            let (x, y, w) = if its == 10 || its == 20 {
                t += x;
                for i in 0..=nn {
                    a[(i, i)] -= x;
                }
                let s = a[(nn, nn - 1)].abs() + a[(nn - 1, nn - 2)].abs();
                (0.75 * s, 0.75 * s, -0.4375 * s * s)
            } else {
                (x, y, w)
            };
            its += 1;
            total += 1;

            qr_step(a, z, l, nn, x, y, w);
        }
    }
    Ok(total)
}

/// Store the 2x2 block ending at `nn` as two eigenvalues, adding back the accumulated `shift`. A
/// real pair is also rotated to upper triangular form in `a` and `z`.
fn deflate_pair(
    a: &mut Matrix,
    z: &mut Matrix,
    wr: &mut [f64],
    wi: &mut [f64],
    nn: usize,
    shift: f64,
) {
    let n = a.rows();
    let y = a[(nn - 1, nn - 1)];
    let w = a[(nn, nn - 1)] * a[(nn - 1, nn)];
    let p = 0.5 * (y - a[(nn, nn)]);
    let q = p * p + w;
    let root = q.abs().sqrt();
    let x = a[(nn, nn)] + shift;
    a[(nn, nn)] = x;
    a[(nn - 1, nn - 1)] = y + shift;

    if q < 0.0 {
        wr[nn - 1] = x + p;
        wr[nn] = x + p;
        wi[nn - 1] = root;
        wi[nn] = -root;
        return;
    }

    let d = p + sign(root, p);
    wr[nn - 1] = x + d;
    wr[nn] = x + d;
    if d != 0.0 {
        wr[nn] = x - w / d;
    }
    wi[nn - 1] = 0.0;
    wi[nn] = 0.0;

    let sub = a[(nn, nn - 1)];
    let s = sub.abs() + d.abs();
    let (p, q) = (sub / s, d / s);
    let r = (p * p + q * q).sqrt();
    let (p, q) = (p / r, q / r);

    for j in nn - 1..n {
        let h = a[(nn - 1, j)];
        a[(nn - 1, j)] = q * h + p * a[(nn, j)];
        a[(nn, j)] = q * a[(nn, j)] - p * h;
    }
    for i in 0..=nn {
        let h = a[(i, nn - 1)];
        a[(i, nn - 1)] = q * h + p * a[(i, nn)];
        a[(i, nn)] = q * a[(i, nn)] - p * h;
    }
    for i in 0..n {
        let h = z[(i, nn - 1)];
        z[(i, nn - 1)] = q * h + p * z[(i, nn)];
        z[(i, nn)] = q * z[(i, nn)] - p * h;
    }
}

/// One implicit double-shift QR sweep over the active block `l..=nn` with shifts from `x`, `y`
/// and `w`.
fn qr_step(a: &mut Matrix, z: &mut Matrix, l: usize, nn: usize, x: f64, y: f64, w: f64) {
    let n = a.rows();

    // Find two consecutive small sub-diagonal elements to start the bulge at.
    let (m, mut p, mut q, mut r) = {
        let mut m = nn - 2;
        loop {
            let d = a[(m, m)];
            let (r, s) = (x - d, y - d);
            let p = (r * s - w) / a[(m + 1, m)] + a[(m, m + 1)];
            let q = a[(m + 1, m + 1)] - d - r - s;
            let r = a[(m + 2, m + 1)];
            let s = p.abs() + q.abs() + r.abs();
            let (p, q, r) = (p / s, q / s, r / s);
            if m == l {
                break (m, p, q, r);
            }
            let u = a[(m, m - 1)].abs() * (q.abs() + r.abs());
            let v = p.abs() * (a[(m - 1, m - 1)].abs() + d.abs() + a[(m + 1, m + 1)].abs());
            if u <= EPS * v {
                break (m, p, q, r);
            }
            m -= 1;
        }
    };

    for i in m..nn - 1 {
        a[(i + 2, i)] = 0.0;
        if i != m {
            a[(i + 2, i - 1)] = 0.0;
        }
    }

    // Chase the bulge down the block.
    for k in m..nn {
        let not_last = k + 1 != nn;
        let mut scale = 0.0;
        if k != m {
            p = a[(k, k - 1)];
            q = a[(k + 1, k - 1)];
            r = if not_last { a[(k + 2, k - 1)] } else { 0.0 };
            scale = p.abs() + q.abs() + r.abs();
            if scale != 0.0 {
                p /= scale;
                q /= scale;
                r /= scale;
            }
        }
        let s = sign((p * p + q * q + r * r).sqrt(), p);
        if s == 0.0 {
            continue;
        }

        if k == m {
            if l != m {
                a[(k, k - 1)] = -a[(k, k - 1)];
            }
        } else {
            a[(k, k - 1)] = -s * scale;
        }
        p += s;
        let (x, y, zeta) = (p / s, q / s, r / s);
        q /= p;
        r /= p;

        // Row modification.
        for j in k..n {
            let mut h = a[(k, j)] + q * a[(k + 1, j)];
            if not_last {
                h += r * a[(k + 2, j)];
                a[(k + 2, j)] -= h * zeta;
            }
            a[(k + 1, j)] -= h * y;
            a[(k, j)] -= h * x;
        }
        // Column modification.
        for i in 0..=nn.min(k + 3) {
            let mut h = x * a[(i, k)] + y * a[(i, k + 1)];
            if not_last {
                h += zeta * a[(i, k + 2)];
                a[(i, k + 2)] -= h * r;
            }
            a[(i, k + 1)] -= h * q;
            a[(i, k)] -= h;
        }
        // Accumulate the transform.
        for i in 0..n {
            let mut h = x * z[(i, k)] + y * z[(i, k + 1)];
            if not_last {
                h += zeta * z[(i, k + 2)];
                z[(i, k + 2)] -= h * r;
            }
            z[(i, k + 1)] -= h * q;
            z[(i, k)] -= h;
        }
    }
}

/// Solve for the eigenvectors of the quasi-triangular Schur form, in place in the upper triangle
/// of `a`.
fn back_substitute(a: &mut Matrix, wr: &[f64], wi: &[f64], norm: f64) {
    let n = a.rows();
    for en in (0..n).rev() {
        let p = wr[en];
        let q = wi[en];
        if q == 0.0 {
            real_vector(a, wr, wi, norm, en, p);
        } else if q < 0.0 {
            complex_vector(a, wr, wi, norm, en, p, q);
        }
    }
}

/// Real eigenvector for the eigenvalue `p` at `en`.
fn real_vector(a: &mut Matrix, wr: &[f64], wi: &[f64], norm: f64, en: usize, p: f64) {
    let mut m = en;
    a[(en, en)] = 1.0;
    let mut z = 0.0;
    let mut s = 0.0;
    for i in (0..en).rev() {
        let w = a[(i, i)] - p;
        let mut r = 0.0;
        for j in m..=en {
            r += a[(i, j)] * a[(j, en)];
        }
        if wi[i] < 0.0 {
            z = w;
            s = r;
            continue;
        }

        m = i;
        if wi[i] == 0.0 {
            let t = if w != 0.0 { w } else { EPS * norm };
            a[(i, en)] = -r / t;
        } else {
            // Solve the real 2x2 system of a complex block.
            let x = a[(i, i + 1)];
            let y = a[(i + 1, i)];
            let q = (wr[i] - p).powi(2) + wi[i] * wi[i];
            let t = (x * s - z * r) / q;
            a[(i, en)] = t;
            a[(i + 1, en)] = if x.abs() > z.abs() {
                (-r - w * t) / x
            } else {
                (-s - y * t) / z
            };
        }

        // Overflow control.
        let t = a[(i, en)].abs();
        if EPS * t * t > 1.0 {
            for j in i..=en {
                a[(j, en)] /= t;
            }
        }
    }
}

/// Complex eigenvector for the pair `p ± i·q` whose second member (`q < 0`) sits at `en`.
///
/// The real part goes to column `en - 1` and the imaginary part to column `en`.
fn complex_vector(
    a: &mut Matrix,
    wr: &[f64],
    wi: &[f64],
    norm: f64,
    en: usize,
    p: f64,
    q: f64,
) {
    let na = en - 1;
    let mut m = na;

    // Last vector component imaginary so the matrix is triangular.
    if a[(en, na)].abs() > a[(na, en)].abs() {
        a[(na, na)] = q / a[(en, na)];
        a[(na, en)] = -(a[(en, en)] - p) / a[(en, na)];
    } else {
        let (re, im) = cdiv(0.0, -a[(na, en)], a[(na, na)] - p, q);
        a[(na, na)] = re;
        a[(na, en)] = im;
    }
    a[(en, na)] = 0.0;
    a[(en, en)] = 1.0;

    let mut z = 0.0;
    let mut r = 0.0;
    let mut s = 0.0;
    for i in (0..na).rev() {
        let w = a[(i, i)] - p;
        let mut ra = 0.0;
        let mut sa = 0.0;
        for j in m..=en {
            ra += a[(i, j)] * a[(j, na)];
            sa += a[(i, j)] * a[(j, en)];
        }
        if wi[i] < 0.0 {
            z = w;
            r = ra;
            s = sa;
            continue;
        }

        m = i;
        if wi[i] == 0.0 {
            let (re, im) = cdiv(-ra, -sa, w, q);
            a[(i, na)] = re;
            a[(i, en)] = im;
        } else {
            // Solve the complex 2x2 system of a complex block.
            let x = a[(i, i + 1)];
            let y = a[(i + 1, i)];
            let mut vr = (wr[i] - p).powi(2) + wi[i] * wi[i] - q * q;
            let vi = 2.0 * q * (wr[i] - p);
            if vr == 0.0 && vi == 0.0 {
                vr = EPS * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
            }
            let (re, im) = cdiv(
                x * r - z * ra + q * sa,
                x * s - z * sa - q * ra,
                vr,
                vi,
            );
            a[(i, na)] = re;
            a[(i, en)] = im;
            if x.abs() > z.abs() + q.abs() {
                a[(i + 1, na)] = (-ra - w * a[(i, na)] + q * a[(i, en)]) / x;
                a[(i + 1, en)] = (-sa - w * a[(i, en)] - q * a[(i, na)]) / x;
            } else {
                let (re, im) = cdiv(-r - y * a[(i, na)], -s - y * a[(i, en)], z, q);
                a[(i + 1, na)] = re;
                a[(i + 1, en)] = im;
            }
        }

        // Overflow control.
        let t = a[(i, na)].abs().max(a[(i, en)].abs());
        if EPS * t * t > 1.0 {
            for j in i..=en {
                a[(j, na)] /= t;
                a[(j, en)] /= t;
            }
        }
    }
}

/// `Z ← Z·T` using the upper triangle of `t`.
fn back_transform(t: &Matrix, z: &mut Matrix) {
    let n = t.rows();
    for j in (0..n).rev() {
        for i in 0..n {
            let mut sum = 0.0;
            for k in 0..=j {
                sum += z[(i, k)] * t[(k, j)];
            }
            z[(i, j)] = sum;
        }
    }
}
