//! N-dimensional strided views.
//!
//! A [`Tensor`] is always a borrowing view: the underlying memory belongs to
//! an [`AlignedBuffer`](crate::buffer::AlignedBuffer) (via `Vector`/`Matrix`)
//! or to any other `f32` slice; the tensor itself never frees anything.
//! Shape transformations (`reshape`, `permute`, `broadcast_to`, `slice`)
//! produce new views over the same memory by stride arithmetic alone.
//!
//! Addressing: `address = offset + Σ index[i] * stride[i]`, with row-major
//! derived strides (innermost axis stride 1).

use crate::{Error, Result};

/// Derive row-major strides and the linear element count for a shape.
pub fn calculate_strides(shape: &[usize]) -> (Vec<usize>, usize) {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    let linear_length = shape.iter().product();
    (strides, linear_length)
}

/// A named, borrowed N-dimensional view over a flat `f32` slice.
#[derive(Debug, Clone)]
pub struct Tensor<'a> {
    name: String,
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    data: &'a [f32],
}

impl<'a> Tensor<'a> {
    /// Build a contiguous row-major view over `data`.
    ///
    /// Fails with `ShapeError` if the shape is empty, has a zero dimension,
    /// or its element count differs from `data.len()`.
    pub fn from_slice(name: &str, shape: &[usize], data: &'a [f32]) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::ShapeError(format!(
                "tensor {name} must have at least one axis"
            )));
        }
        if shape.contains(&0) {
            return Err(Error::ShapeError(format!(
                "tensor {name} has a zero-length axis: {shape:?}"
            )));
        }
        let (strides, linear_length) = calculate_strides(shape);
        if linear_length != data.len() {
            return Err(Error::ShapeError(format!(
                "tensor {name} shape {shape:?} needs {linear_length} elements, slice has {}",
                data.len()
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            shape: shape.to_vec(),
            strides,
            offset: 0,
            data,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of addressable elements (product of the shape).
    #[inline]
    pub fn linear_length(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the innermost axis is laid out densely (stride 1).
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.strides.last().copied() == Some(1)
    }

    /// Bounds-checked indexed read.
    ///
    /// The index tuple must have exactly `rank` components
    /// (`DimensionMismatch`) and every component must be inside its axis
    /// (`IndexOutOfRange`).
    pub fn get(&self, indices: &[usize]) -> Result<f32> {
        if indices.len() != self.rank() {
            return Err(Error::DimensionMismatch(format!(
                "tensor {} expects {} indices, got {}",
                self.name,
                self.rank(),
                indices.len()
            )));
        }
        let mut addr = self.offset;
        for (axis, (&idx, (&dim, &stride))) in indices
            .iter()
            .zip(self.shape.iter().zip(&self.strides))
            .enumerate()
        {
            if idx >= dim {
                return Err(Error::IndexOutOfRange(format!(
                    "tensor {}: index {idx} >= {dim} on axis {axis}",
                    self.name
                )));
            }
            addr += idx * stride;
        }
        Ok(self.data[addr])
    }

    /// Reinterpret the same memory under a new shape.
    ///
    /// Requires a densely packed (row-major) source view and an element
    /// count equal to the original; both violations are `ShapeError`.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Tensor<'a>> {
        let (packed, _) = calculate_strides(&self.shape);
        if self.strides != packed {
            return Err(Error::ShapeError(format!(
                "tensor {} is not densely packed; reshape would reorder elements",
                self.name
            )));
        }
        if new_shape.is_empty() || new_shape.contains(&0) {
            return Err(Error::ShapeError(format!(
                "tensor {}: invalid target shape {new_shape:?}",
                self.name
            )));
        }
        let (new_strides, new_len) = calculate_strides(new_shape);
        if new_len != self.linear_length() {
            return Err(Error::ShapeError(format!(
                "tensor {}: cannot reshape {:?} ({} elements) to {new_shape:?} ({new_len} elements)",
                self.name,
                self.shape,
                self.linear_length()
            )));
        }
        Ok(Tensor {
            name: self.name.clone(),
            shape: new_shape.to_vec(),
            strides: new_strides,
            offset: self.offset,
            data: self.data,
        })
    }

    /// Reorder axes by a permutation of `[0..rank)`.
    pub fn permute(&self, order: &[usize]) -> Result<Tensor<'a>> {
        if order.len() != self.rank() {
            return Err(Error::ShapeError(format!(
                "tensor {}: permutation {order:?} must have {} axes",
                self.name,
                self.rank()
            )));
        }
        let mut seen = vec![false; self.rank()];
        for &axis in order {
            if axis >= self.rank() || seen[axis] {
                return Err(Error::ShapeError(format!(
                    "tensor {}: {order:?} is not a permutation of 0..{}",
                    self.name,
                    self.rank()
                )));
            }
            seen[axis] = true;
        }
        Ok(Tensor {
            name: self.name.clone(),
            shape: order.iter().map(|&a| self.shape[a]).collect(),
            strides: order.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
            data: self.data,
        })
    }

    /// Swap the two axes of a rank-2 view.
    pub fn transpose(&self) -> Result<Tensor<'a>> {
        if self.rank() != 2 {
            return Err(Error::UnsupportedOperation(format!(
                "tensor {}: transpose requires rank 2, got rank {}",
                self.name,
                self.rank()
            )));
        }
        self.permute(&[1, 0])
    }

    /// Expand to a larger shape by replaying values along zero-stride axes.
    ///
    /// Axes are aligned from the trailing end. A source axis must either
    /// match the target dimension (stride kept) or be 1 (stride set to 0);
    /// new leading axes also get stride 0.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Tensor<'a>> {
        if target.len() < self.rank() {
            return Err(Error::ShapeError(format!(
                "tensor {}: cannot broadcast rank {} to lower rank {}",
                self.name,
                self.rank(),
                target.len()
            )));
        }
        if target.contains(&0) {
            return Err(Error::ShapeError(format!(
                "tensor {}: invalid broadcast target {target:?}",
                self.name
            )));
        }

        let lead = target.len() - self.rank();
        let mut strides = vec![0; target.len()];
        for (i, (&dim, &stride)) in self.shape.iter().zip(&self.strides).enumerate() {
            let tgt = target[lead + i];
            if dim == tgt {
                strides[lead + i] = stride;
            } else if dim == 1 {
                strides[lead + i] = 0;
            } else {
                return Err(Error::ShapeError(format!(
                    "tensor {}: axis {i} of size {dim} cannot broadcast to {tgt}",
                    self.name
                )));
            }
        }
        Ok(Tensor {
            name: self.name.clone(),
            shape: target.to_vec(),
            strides,
            offset: self.offset,
            data: self.data,
        })
    }

    /// Fix the first `leading.len()` indices and view the trailing axes.
    pub fn slice(&self, leading: &[usize]) -> Result<Tensor<'a>> {
        if leading.len() >= self.rank() {
            return Err(Error::ShapeError(format!(
                "tensor {}: slicing {} indices leaves no axes (rank {})",
                self.name,
                leading.len(),
                self.rank()
            )));
        }
        let mut offset = self.offset;
        for (axis, (&idx, (&dim, &stride))) in leading
            .iter()
            .zip(self.shape.iter().zip(&self.strides))
            .enumerate()
        {
            if idx >= dim {
                return Err(Error::IndexOutOfRange(format!(
                    "tensor {}: index {idx} >= {dim} on axis {axis}",
                    self.name
                )));
            }
            offset += idx * stride;
        }
        Ok(Tensor {
            name: self.name.clone(),
            shape: self.shape[leading.len()..].to_vec(),
            strides: self.strides[leading.len()..].to_vec(),
            offset,
            data: self.data,
        })
    }

    /// Copy the view's elements into a dense row-major vector.
    pub fn to_contiguous(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.linear_length());
        let mut index = vec![0usize; self.rank()];
        loop {
            let mut addr = self.offset;
            for (&idx, &stride) in index.iter().zip(&self.strides) {
                addr += idx * stride;
            }
            out.push(self.data[addr]);

            // Odometer increment over the index tuple.
            let mut axis = self.rank();
            loop {
                if axis == 0 {
                    return out;
                }
                axis -= 1;
                index[axis] += 1;
                if index[axis] < self.shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
    }
}
