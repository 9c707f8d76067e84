//! Named 1-D numeric container and its elementwise kernels.
//!
//! All in-place kernels walk the buffer in fixed chunks of [`LANES`] floats
//! (written as explicit 4-wide arithmetic the compiler turns into SIMD) with
//! a scalar loop for any remainder. Vector lengths are required to be even at
//! construction, so with the documented invariants the remainder path is
//! unreachable — it is still implemented correctly for defensive use.
//!
//! Every binary operation checks operand lengths first and returns
//! `DimensionMismatch` before touching any data.

use crate::buffer::AlignedBuffer;
use crate::tensor::Tensor;
use crate::{Error, Result};

/// Number of scalar values processed per vectorized kernel step.
pub const LANES: usize = 4;

/// A named, fixed-length vector of `f32`s backed by an [`AlignedBuffer`].
#[derive(Debug)]
pub struct Vector {
    name: String,
    buf: AlignedBuffer,
}

impl Vector {
    /// Allocate a zeroed vector.
    ///
    /// `length` must be even and non-zero; the kernels size their remainder
    /// loops around that invariant.
    pub fn zeroed(name: &str, length: usize) -> Result<Self> {
        if length == 0 || length % 2 != 0 {
            return Err(Error::ShapeError(format!(
                "vector {name} length must be even and > 0, got {length}"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            buf: AlignedBuffer::zeroed(length)?,
        })
    }

    /// Allocate a vector and copy `values` into it.
    pub fn from_slice(name: &str, values: &[f32]) -> Result<Self> {
        let mut v = Self::zeroed(name, values.len())?;
        v.buf.as_mut_slice().copy_from_slice(values);
        Ok(v)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.buf.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.buf.as_mut_slice()
    }

    /// Overwrite the contents from a slice of the same length.
    pub fn load(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::DimensionMismatch(format!(
                "cannot load {} values into {}[len={}]",
                values.len(),
                self.name,
                self.len()
            )));
        }
        self.buf.as_mut_slice().copy_from_slice(values);
        Ok(())
    }

    /// Bounds-checked element read.
    pub fn get(&self, idx: usize) -> Result<f32> {
        self.as_slice().get(idx).copied().ok_or_else(|| {
            Error::IndexOutOfRange(format!("{}: {idx} >= {}", self.name, self.len()))
        })
    }

    /// Bounds-checked element write.
    pub fn set(&mut self, idx: usize, value: f32) -> Result<()> {
        let len = self.len();
        let name = self.name.clone();
        match self.as_mut_slice().get_mut(idx) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfRange(format!("{name}: {idx} >= {len}"))),
        }
    }

    /// Set every element to zero.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// A borrowing rank-1 tensor view over this vector's storage.
    pub fn tensor_view(&self) -> Tensor<'_> {
        Tensor::from_slice(&self.name, &[self.len()], self.as_slice())
            .expect("vector length matches its own shape")
    }

    /// Free the backing buffer early. Idempotent; the vector is unusable
    /// (length 0) afterwards. Dropping the vector has the same effect.
    pub fn release(&mut self) {
        self.buf.release();
    }

    /// `self += other`.
    pub fn add_elementwise(&mut self, other: &Vector) -> Result<()> {
        check_same_len(self, other)?;
        add_assign(self.as_mut_slice(), other.as_slice());
        Ok(())
    }

    /// `self += other * weight` (the axpy-style weighted add).
    pub fn add_elementwise_weighted(&mut self, other: &Vector, weight: f32) -> Result<()> {
        check_same_len(self, other)?;
        add_weighted_assign(self.as_mut_slice(), other.as_slice(), weight);
        Ok(())
    }

    /// `self -= other`.
    pub fn subtract_elementwise(&mut self, other: &Vector) -> Result<()> {
        check_same_len(self, other)?;
        sub_assign(self.as_mut_slice(), other.as_slice());
        Ok(())
    }

    /// `self ⊙= other` (Hadamard product in place).
    pub fn multiply_elementwise(&mut self, other: &Vector) -> Result<()> {
        check_same_len(self, other)?;
        mul_assign(self.as_mut_slice(), other.as_slice());
        Ok(())
    }

    /// `result = left + right`.
    pub fn add_into(left: &Vector, right: &Vector, result: &mut Vector) -> Result<()> {
        check_same_len(left, right)?;
        check_same_len(left, result)?;
        add_into_slices(left.as_slice(), right.as_slice(), result.as_mut_slice());
        Ok(())
    }

    /// `result = left - right`.
    pub fn subtract_into(left: &Vector, right: &Vector, result: &mut Vector) -> Result<()> {
        check_same_len(left, right)?;
        check_same_len(left, result)?;
        sub_into_slices(left.as_slice(), right.as_slice(), result.as_mut_slice());
        Ok(())
    }

    /// `result = left ⊙ right` (Hadamard product).
    pub fn multiply_into(left: &Vector, right: &Vector, result: &mut Vector) -> Result<()> {
        check_same_len(left, right)?;
        check_same_len(left, result)?;
        mul_into_slices(left.as_slice(), right.as_slice(), result.as_mut_slice());
        Ok(())
    }
}

#[inline]
fn check_same_len(left: &Vector, right: &Vector) -> Result<()> {
    if left.len() != right.len() {
        return Err(Error::DimensionMismatch(format!(
            "vectors must be the same length: {}[len={}] vs {}[len={}]",
            left.name,
            left.len(),
            right.name,
            right.len()
        )));
    }
    Ok(())
}

// Lane-width kernels, shared with the matrix code. Callers have already
// verified that the slice lengths agree.

#[inline]
pub(crate) fn add_assign(dst: &mut [f32], src: &[f32]) {
    let mut d = dst.chunks_exact_mut(LANES);
    let mut s = src.chunks_exact(LANES);
    for (dc, sc) in (&mut d).zip(&mut s) {
        dc[0] += sc[0];
        dc[1] += sc[1];
        dc[2] += sc[2];
        dc[3] += sc[3];
    }
    for (dv, sv) in d.into_remainder().iter_mut().zip(s.remainder()) {
        *dv += *sv;
    }
}

#[inline]
pub(crate) fn add_weighted_assign(dst: &mut [f32], src: &[f32], weight: f32) {
    let mut d = dst.chunks_exact_mut(LANES);
    let mut s = src.chunks_exact(LANES);
    for (dc, sc) in (&mut d).zip(&mut s) {
        dc[0] = sc[0].mul_add(weight, dc[0]);
        dc[1] = sc[1].mul_add(weight, dc[1]);
        dc[2] = sc[2].mul_add(weight, dc[2]);
        dc[3] = sc[3].mul_add(weight, dc[3]);
    }
    for (dv, sv) in d.into_remainder().iter_mut().zip(s.remainder()) {
        *dv = sv.mul_add(weight, *dv);
    }
}

#[inline]
pub(crate) fn sub_assign(dst: &mut [f32], src: &[f32]) {
    let mut d = dst.chunks_exact_mut(LANES);
    let mut s = src.chunks_exact(LANES);
    for (dc, sc) in (&mut d).zip(&mut s) {
        dc[0] -= sc[0];
        dc[1] -= sc[1];
        dc[2] -= sc[2];
        dc[3] -= sc[3];
    }
    for (dv, sv) in d.into_remainder().iter_mut().zip(s.remainder()) {
        *dv -= *sv;
    }
}

#[inline]
pub(crate) fn mul_assign(dst: &mut [f32], src: &[f32]) {
    let mut d = dst.chunks_exact_mut(LANES);
    let mut s = src.chunks_exact(LANES);
    for (dc, sc) in (&mut d).zip(&mut s) {
        dc[0] *= sc[0];
        dc[1] *= sc[1];
        dc[2] *= sc[2];
        dc[3] *= sc[3];
    }
    for (dv, sv) in d.into_remainder().iter_mut().zip(s.remainder()) {
        *dv *= *sv;
    }
}

#[inline]
pub(crate) fn add_into_slices(left: &[f32], right: &[f32], out: &mut [f32]) {
    let mut l = left.chunks_exact(LANES);
    let mut r = right.chunks_exact(LANES);
    let mut o = out.chunks_exact_mut(LANES);
    for ((lc, rc), oc) in (&mut l).zip(&mut r).zip(&mut o) {
        oc[0] = lc[0] + rc[0];
        oc[1] = lc[1] + rc[1];
        oc[2] = lc[2] + rc[2];
        oc[3] = lc[3] + rc[3];
    }
    for ((lv, rv), ov) in l
        .remainder()
        .iter()
        .zip(r.remainder())
        .zip(o.into_remainder())
    {
        *ov = lv + rv;
    }
}

#[inline]
pub(crate) fn sub_into_slices(left: &[f32], right: &[f32], out: &mut [f32]) {
    let mut l = left.chunks_exact(LANES);
    let mut r = right.chunks_exact(LANES);
    let mut o = out.chunks_exact_mut(LANES);
    for ((lc, rc), oc) in (&mut l).zip(&mut r).zip(&mut o) {
        oc[0] = lc[0] - rc[0];
        oc[1] = lc[1] - rc[1];
        oc[2] = lc[2] - rc[2];
        oc[3] = lc[3] - rc[3];
    }
    for ((lv, rv), ov) in l
        .remainder()
        .iter()
        .zip(r.remainder())
        .zip(o.into_remainder())
    {
        *ov = lv - rv;
    }
}

#[inline]
pub(crate) fn mul_into_slices(left: &[f32], right: &[f32], out: &mut [f32]) {
    let mut l = left.chunks_exact(LANES);
    let mut r = right.chunks_exact(LANES);
    let mut o = out.chunks_exact_mut(LANES);
    for ((lc, rc), oc) in (&mut l).zip(&mut r).zip(&mut o) {
        oc[0] = lc[0] * rc[0];
        oc[1] = lc[1] * rc[1];
        oc[2] = lc[2] * rc[2];
        oc[3] = lc[3] * rc[3];
    }
    for ((lv, rv), ov) in l
        .remainder()
        .iter()
        .zip(r.remainder())
        .zip(o.into_remainder())
    {
        *ov = lv * rv;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_length_is_rejected() {
        assert!(Vector::zeroed("v", 3).is_err());
        assert!(Vector::zeroed("v", 0).is_err());
        assert!(Vector::zeroed("v", 4).is_ok());
    }

    #[test]
    fn add_elementwise_scenario() {
        // add_elementwise([1,2,3,4], [4,3,2,1]) == [5,5,5,5]
        let a = Vector::from_slice("a", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Vector::from_slice("b", &[4.0, 3.0, 2.0, 1.0]).unwrap();
        let mut out = Vector::zeroed("out", 4).unwrap();
        Vector::add_into(&a, &b, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn subtract_undoes_add() {
        let a = Vector::from_slice("a", &[0.5, -1.25, 3.75, 2.0, -0.125, 7.5]).unwrap();
        let b = Vector::from_slice("b", &[1.0, 2.0, -3.0, 0.25, 4.0, -2.5]).unwrap();
        let mut sum = Vector::zeroed("sum", 6).unwrap();
        let mut back = Vector::zeroed("back", 6).unwrap();

        Vector::add_into(&a, &b, &mut sum).unwrap();
        Vector::subtract_into(&sum, &b, &mut back).unwrap();

        for (x, y) in back.as_slice().iter().zip(a.as_slice()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn weighted_add_is_fma() {
        let mut a = Vector::from_slice("a", &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        let b = Vector::from_slice("b", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        a.add_elementwise_weighted(&b, 0.5).unwrap();
        assert_eq!(a.as_slice(), &[1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn in_place_subtract_and_multiply() {
        let mut a = Vector::from_slice("a", &[5.0, 5.0, 5.0, 5.0]).unwrap();
        let b = Vector::from_slice("b", &[4.0, 3.0, 2.0, 1.0]).unwrap();
        a.subtract_elementwise(&b).unwrap();
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        a.multiply_elementwise(&b).unwrap();
        assert_eq!(a.as_slice(), &[4.0, 6.0, 6.0, 4.0]);
    }

    #[test]
    fn mismatched_lengths_do_not_mutate() {
        let mut a = Vector::from_slice("a", &[1.0, 2.0]).unwrap();
        let b = Vector::from_slice("b", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = a.add_elementwise(&b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
        assert_eq!(a.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn indexing_is_bounds_checked() {
        let mut v = Vector::from_slice("v", &[1.0, 2.0]).unwrap();
        assert_eq!(v.get(1).unwrap(), 2.0);
        assert!(matches!(v.get(2), Err(Error::IndexOutOfRange(_))));
        assert!(matches!(v.set(7, 0.0), Err(Error::IndexOutOfRange(_))));
        v.set(0, 9.0).unwrap();
        assert_eq!(v.get(0).unwrap(), 9.0);
    }

    #[test]
    fn load_requires_exact_length() {
        let mut v = Vector::zeroed("v", 4).unwrap();
        assert!(v.load(&[1.0, 2.0, 3.0]).is_err());
        v.load(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn remainder_path_handles_non_lane_multiples() {
        // Even length that is not a multiple of LANES exercises the tail loop.
        let mut a = Vector::from_slice("a", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Vector::from_slice("b", &[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
        a.add_elementwise(&b).unwrap();
        assert_eq!(a.as_slice(), &[7.0; 6]);
    }
}
