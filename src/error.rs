use std::fmt;

/// Errors raised by the compute engine.
///
/// Every check happens eagerly at the boundary of the operation that depends
/// on it; on failure the operation returns before mutating its target. These
/// are programmer/configuration errors, not transient faults — there is no
/// retry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operand shapes/lengths are incompatible for an operation.
    DimensionMismatch(String),
    /// An accessor index is outside the valid bounds.
    IndexOutOfRange(String),
    /// A reshape/permute/broadcast argument is inconsistent with the source shape.
    ShapeError(String),
    /// The operation is not defined for this operand (e.g. transpose on rank != 2).
    UnsupportedOperation(String),
    /// A named tensor/weight is absent from a loaded source.
    KeyNotFound(String),
    /// The allocator refused an aligned allocation.
    AllocationFailure(String),
    /// A configuration value is out of range or inconsistent.
    InvalidConfig(String),
    /// Input data failed validation (persistence, datasets).
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch(msg) => write!(f, "dimension mismatch: {msg}"),
            Error::IndexOutOfRange(msg) => write!(f, "index out of range: {msg}"),
            Error::ShapeError(msg) => write!(f, "shape error: {msg}"),
            Error::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Error::KeyNotFound(msg) => write!(f, "key not found: {msg}"),
            Error::AllocationFailure(msg) => write!(f, "allocation failure: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
