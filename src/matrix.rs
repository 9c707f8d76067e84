//! Named row-major 2-D container and the backprop kernels built on it.
//!
//! `output_count` is the number of rows (layer outputs) and `input_count`
//! the number of columns (layer inputs), matching the weight-matrix
//! orientation used throughout the crate. The linear length must be
//! divisible by 4 so the elementwise kernels run full 4-wide tiles.

use crate::backend::{self, Backend};
use crate::tensor::Tensor;
use crate::vector::{self, Vector};
use crate::{Error, Result};

/// A named `output_count × input_count` matrix backed by an aligned buffer.
#[derive(Debug)]
pub struct Matrix {
    name: String,
    output_count: usize,
    input_count: usize,
    buf: crate::buffer::AlignedBuffer,
}

impl Matrix {
    /// Allocate a zeroed matrix.
    ///
    /// Both dimensions must be non-zero and `rows * cols` must be divisible
    /// by 4 (the elementwise kernels assume full tiles at this granularity).
    pub fn zeroed(name: &str, output_count: usize, input_count: usize) -> Result<Self> {
        if output_count == 0 || input_count == 0 {
            return Err(Error::ShapeError(format!(
                "matrix {name} dimensions must be > 0, got {output_count}x{input_count}"
            )));
        }
        let linear_length = output_count * input_count;
        if linear_length % 4 != 0 {
            return Err(Error::ShapeError(format!(
                "matrix {name} linear length must be divisible by 4, got {linear_length}"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            output_count,
            input_count,
            buf: crate::buffer::AlignedBuffer::zeroed(linear_length)?,
        })
    }

    /// Allocate a matrix and copy row-major `values` into it.
    pub fn from_slice(
        name: &str,
        output_count: usize,
        input_count: usize,
        values: &[f32],
    ) -> Result<Self> {
        let mut m = Self::zeroed(name, output_count, input_count)?;
        m.load(values)?;
        Ok(m)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    #[inline]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Number of columns.
    #[inline]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    #[inline]
    pub fn linear_length(&self) -> usize {
        self.output_count * self.input_count
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.buf.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.buf.as_mut_slice()
    }

    /// Overwrite the contents from a row-major slice of matching length.
    pub fn load(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.linear_length() {
            return Err(Error::DimensionMismatch(format!(
                "cannot load {} values into {}[{}x{}]",
                values.len(),
                self.name,
                self.output_count,
                self.input_count
            )));
        }
        self.buf.as_mut_slice().copy_from_slice(values);
        Ok(())
    }

    /// Bounds-checked element read.
    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        self.check_indices(row, col)?;
        Ok(self.as_slice()[row * self.input_count + col])
    }

    /// Bounds-checked element write.
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        self.check_indices(row, col)?;
        let cols = self.input_count;
        self.as_mut_slice()[row * cols + col] = value;
        Ok(())
    }

    fn check_indices(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.output_count {
            return Err(Error::IndexOutOfRange(format!(
                "{}: row {row} >= {}",
                self.name, self.output_count
            )));
        }
        if col >= self.input_count {
            return Err(Error::IndexOutOfRange(format!(
                "{}: column {col} >= {}",
                self.name, self.input_count
            )));
        }
        Ok(())
    }

    /// Non-owning view over one row.
    pub fn row(&self, idx: usize) -> Result<&[f32]> {
        if idx >= self.output_count {
            return Err(Error::IndexOutOfRange(format!(
                "{}: row {idx} >= {}",
                self.name, self.output_count
            )));
        }
        let start = idx * self.input_count;
        Ok(&self.as_slice()[start..start + self.input_count])
    }

    /// Mutable non-owning view over one row.
    pub fn row_mut(&mut self, idx: usize) -> Result<&mut [f32]> {
        if idx >= self.output_count {
            return Err(Error::IndexOutOfRange(format!(
                "{}: row {idx} >= {}",
                self.name, self.output_count
            )));
        }
        let cols = self.input_count;
        let start = idx * cols;
        Ok(&mut self.as_mut_slice()[start..start + cols])
    }

    /// Set every element to zero.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Multiply every element by `x` in place.
    pub fn scale(&mut self, x: f32) {
        for chunk in self.as_mut_slice().chunks_exact_mut(vector::LANES) {
            chunk[0] *= x;
            chunk[1] *= x;
            chunk[2] *= x;
            chunk[3] *= x;
        }
    }

    /// `self += other`.
    pub fn add_elementwise(&mut self, other: &Matrix) -> Result<()> {
        self.check_same_shape(other)?;
        vector::add_assign(self.as_mut_slice(), other.as_slice());
        Ok(())
    }

    /// `self += other * weight`.
    pub fn add_elementwise_weighted(&mut self, other: &Matrix, weight: f32) -> Result<()> {
        self.check_same_shape(other)?;
        vector::add_weighted_assign(self.as_mut_slice(), other.as_slice(), weight);
        Ok(())
    }

    fn check_same_shape(&self, other: &Matrix) -> Result<()> {
        if self.output_count != other.output_count || self.input_count != other.input_count {
            return Err(Error::DimensionMismatch(format!(
                "matrices must be the same shape: {}[{}x{}] vs {}[{}x{}]",
                self.name,
                self.output_count,
                self.input_count,
                other.name,
                other.output_count,
                other.input_count
            )));
        }
        Ok(())
    }

    /// Rank-1 update `self[i, j] += left[i] * right[j]`, the accumulation
    /// step for weight gradients.
    pub fn add_outer_product(&mut self, left: &Vector, right: &Vector) -> Result<()> {
        self.add_outer_product_weighted(left, right, 1.0)
    }

    /// Rank-1 update scaled by `weight`: `self[i, j] += weight * left[i] * right[j]`.
    pub fn add_outer_product_weighted(
        &mut self,
        left: &Vector,
        right: &Vector,
        weight: f32,
    ) -> Result<()> {
        if left.len() != self.output_count {
            return Err(Error::DimensionMismatch(format!(
                "outer product: {}[len={}] must match {} rows ({})",
                left.name(),
                left.len(),
                self.name,
                self.output_count
            )));
        }
        if right.len() != self.input_count {
            return Err(Error::DimensionMismatch(format!(
                "outer product: {}[len={}] must match {} columns ({})",
                right.name(),
                right.len(),
                self.name,
                self.input_count
            )));
        }

        let cols = self.input_count;
        let data = self.as_mut_slice();
        for (i, &lv) in left.as_slice().iter().enumerate() {
            let row = &mut data[i * cols..(i + 1) * cols];
            vector::add_weighted_assign(row, right.as_slice(), lv * weight);
        }
        Ok(())
    }

    /// `result[i] = Σ_j self[i, j] * right[j]`.
    ///
    /// Executed on the explicit lane-width path or delegated to the BLAS
    /// routine depending on `backend`; the two agree within floating-point
    /// tolerance.
    pub fn multiply(&self, right: &Vector, result: &mut Vector, backend: Backend) -> Result<()> {
        if right.len() != self.input_count {
            return Err(Error::DimensionMismatch(format!(
                "{}[len={}] must have the length of {} columns ({})",
                right.name(),
                right.len(),
                self.name,
                self.input_count
            )));
        }
        if result.len() != self.output_count {
            return Err(Error::DimensionMismatch(format!(
                "{}[len={}] must have the length of {} rows ({})",
                result.name(),
                result.len(),
                self.name,
                self.output_count
            )));
        }
        backend::gemv(
            backend,
            self.output_count,
            self.input_count,
            self.as_slice(),
            right.as_slice(),
            result.as_mut_slice(),
        );
        Ok(())
    }

    /// `result[j] = Σ_i self[i, j] * right[i]` — the transposed product used
    /// to push gradients to the upstream layer.
    pub fn multiply_transpose(
        &self,
        right: &Vector,
        result: &mut Vector,
        backend: Backend,
    ) -> Result<()> {
        if right.len() != self.output_count {
            return Err(Error::DimensionMismatch(format!(
                "{}[len={}] must have the length of {} rows ({})",
                right.name(),
                right.len(),
                self.name,
                self.output_count
            )));
        }
        if result.len() != self.input_count {
            return Err(Error::DimensionMismatch(format!(
                "{}[len={}] must have the length of {} columns ({})",
                result.name(),
                result.len(),
                self.name,
                self.input_count
            )));
        }
        backend::gemv_transpose(
            backend,
            self.output_count,
            self.input_count,
            self.as_slice(),
            right.as_slice(),
            result.as_mut_slice(),
        );
        Ok(())
    }

    /// A borrowing rank-2 tensor view over this matrix's storage.
    pub fn tensor_view(&self) -> Tensor<'_> {
        Tensor::from_slice(
            &self.name,
            &[self.output_count, self.input_count],
            self.as_slice(),
        )
        .expect("matrix linear length matches its own shape")
    }

    /// Free the backing buffer early. Idempotent.
    pub fn release(&mut self) {
        self.buf.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_invariants_are_enforced() {
        assert!(Matrix::zeroed("w", 0, 4).is_err());
        assert!(Matrix::zeroed("w", 3, 1).is_err()); // 3 % 4 != 0
        assert!(Matrix::zeroed("w", 2, 2).is_ok());
        assert!(Matrix::zeroed("w", 3, 4).is_ok());
    }

    #[test]
    fn matvec_scenario() {
        // [[1,2],[3,4]] * [1,1] == [3,7]
        let m = Matrix::from_slice("m", 2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let x = Vector::from_slice("x", &[1.0, 1.0]).unwrap();
        let mut y = Vector::zeroed("y", 2).unwrap();

        m.multiply(&x, &mut y, Backend::Vectorized).unwrap();
        assert_eq!(y.as_slice(), &[3.0, 7.0]);

        m.multiply(&x, &mut y, Backend::Blas).unwrap();
        assert!((y.get(0).unwrap() - 3.0).abs() < 1e-6);
        assert!((y.get(1).unwrap() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn transpose_multiply_matches_manual_sum() {
        let m = Matrix::from_slice("m", 2, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let x = Vector::from_slice("x", &[1.0, 0.5]).unwrap();
        let mut y = Vector::zeroed("y", 4).unwrap();
        m.multiply_transpose(&x, &mut y, Backend::Vectorized).unwrap();
        // y[j] = m[0,j] + 0.5 * m[1,j]
        assert_eq!(y.as_slice(), &[3.5, 5.0, 6.5, 8.0]);
    }

    #[test]
    fn outer_product_accumulates() {
        let mut m = Matrix::zeroed("m", 2, 4).unwrap();
        let a = Vector::from_slice("a", &[1.0, 2.0]).unwrap();
        let b = Vector::from_slice("b", &[1.0, 2.0, 3.0, 4.0]).unwrap();

        m.add_outer_product(&a, &b).unwrap();
        m.add_outer_product(&a, &b).unwrap();

        assert_eq!(m.row(0).unwrap(), &[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(m.row(1).unwrap(), &[4.0, 8.0, 12.0, 16.0]);
    }

    #[test]
    fn mismatched_operands_do_not_mutate() {
        let mut m = Matrix::zeroed("m", 2, 4).unwrap();
        let wrong = Vector::from_slice("wrong", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Vector::from_slice("b", &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let err = m.add_outer_product(&wrong, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn row_views_and_indexing() {
        let mut m = Matrix::zeroed("m", 2, 2).unwrap();
        m.set(1, 1, 5.0).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 5.0);
        assert_eq!(m.row(1).unwrap(), &[0.0, 5.0]);
        assert!(matches!(m.row(2), Err(Error::IndexOutOfRange(_))));
        assert!(matches!(m.get(0, 2), Err(Error::IndexOutOfRange(_))));
    }

    #[test]
    fn scale_and_weighted_add() {
        let mut m = Matrix::from_slice("m", 2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let g = Matrix::from_slice("g", 2, 2, &[4.0, 3.0, 2.0, 1.0]).unwrap();
        m.scale(2.0);
        assert_eq!(m.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
        m.add_elementwise_weighted(&g, 0.5).unwrap();
        assert_eq!(m.as_slice(), &[4.0, 5.5, 7.0, 8.5]);
    }
}
