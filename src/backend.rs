//! Matrix-vector execution backends.
//!
//! Two deliberately distinct implementations of the same contract:
//!
//! - [`Backend::Vectorized`] — the crate's own lane-width loops with a
//!   horizontal reduction per output element.
//! - [`Backend::Blas`] — delegation to `matrixmultiply::sgemm` (a gemv is a
//!   gemm with one right-hand column).
//!
//! The two paths must agree within floating-point tolerance; keeping both
//! gives a correctness cross-check and a portable fallback. The backend is
//! an explicit configuration value threaded through construction, never
//! process-global state, so concurrent runs with different backends are
//! deterministic.

use crate::vector::LANES;

/// How matrix-vector products are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Explicit lane-width inner loop (default).
    #[default]
    Vectorized,
    /// Delegate to the BLAS-style `matrixmultiply` routine.
    Blas,
}

/// `y = A · x` where `A` is row-major `m × k`, `x` has length `k` and `y`
/// has length `m`. Lengths are validated by the callers in `matrix.rs`.
pub(crate) fn gemv(backend: Backend, m: usize, k: usize, a: &[f32], x: &[f32], y: &mut [f32]) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(x.len(), k);
    debug_assert_eq!(y.len(), m);

    match backend {
        Backend::Vectorized => gemv_lanes(m, k, a, x, y),
        Backend::Blas => gemm_delegate(m, k, a, k as isize, 1, x, y),
    }
}

/// `y = Aᵗ · x` where `A` is row-major `m × k`, `x` has length `m` and `y`
/// has length `k`. Used for the backward pass.
pub(crate) fn gemv_transpose(
    backend: Backend,
    m: usize,
    k: usize,
    a: &[f32],
    x: &[f32],
    y: &mut [f32],
) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(x.len(), m);
    debug_assert_eq!(y.len(), k);

    match backend {
        Backend::Vectorized => gemv_t_lanes(m, k, a, x, y),
        // The transpose is a stride swap: walk A column-major.
        Backend::Blas => gemm_delegate(k, m, a, 1, k as isize, x, y),
    }
}

/// Per output row: four running partial sums over 4-wide tiles, folded with
/// a horizontal reduction, plus a scalar tail for defensive completeness.
fn gemv_lanes(m: usize, k: usize, a: &[f32], x: &[f32], y: &mut [f32]) {
    for (i, out) in y.iter_mut().enumerate() {
        let row = &a[i * k..(i + 1) * k];
        let mut acc = [0.0f32; LANES];

        let mut rc = row.chunks_exact(LANES);
        let mut xc = x.chunks_exact(LANES);
        for (r, xv) in (&mut rc).zip(&mut xc) {
            acc[0] = r[0].mul_add(xv[0], acc[0]);
            acc[1] = r[1].mul_add(xv[1], acc[1]);
            acc[2] = r[2].mul_add(xv[2], acc[2]);
            acc[3] = r[3].mul_add(xv[3], acc[3]);
        }

        let mut sum = (acc[0] + acc[2]) + (acc[1] + acc[3]);
        for (r, xv) in rc.remainder().iter().zip(xc.remainder()) {
            sum = r.mul_add(*xv, sum);
        }
        *out = sum;
    }
}

/// Transposed product without materializing Aᵗ: each input row of `A`
/// scatters `x[i] * A[i, ..]` into the output with 4-wide weighted adds.
fn gemv_t_lanes(m: usize, k: usize, a: &[f32], x: &[f32], y: &mut [f32]) {
    y.fill(0.0);
    for i in 0..m {
        let row = &a[i * k..(i + 1) * k];
        let xi = x[i];
        crate::vector::add_weighted_assign(y, row, xi);
    }
}

/// gemv as a gemm with a single right-hand column.
fn gemm_delegate(m: usize, k: usize, a: &[f32], rsa: isize, csa: isize, x: &[f32], y: &mut [f32]) {
    // matrixmultiply's sgemm takes raw pointers with explicit strides; the
    // slices were sized by the caller.
    unsafe {
        matrixmultiply::sgemm(
            m,
            k,
            1,
            1.0,
            a.as_ptr(),
            rsa,
            csa,
            x.as_ptr(),
            1,
            1,
            0.0,
            y.as_mut_ptr(),
            1,
            1,
        );
    }
}
