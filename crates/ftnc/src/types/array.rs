//! Array shapes

use std::fmt;

/// One dimension with inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayDim {
    pub lower: i64,
    pub upper: i64,
}

impl ArrayDim {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Dimension declared as `A(N)`, i.e. `1:N`
    pub fn upto(upper: i64) -> Self {
        Self::new(1, upper)
    }

    /// Number of elements along this dimension; empty when `upper < lower`
    pub fn extent(&self) -> u64 {
        let extent = i128::from(self.upper) - i128::from(self.lower) + 1;
        u64::try_from(extent.max(0)).unwrap_or(u64::MAX)
    }
}

/// Shape of an array type. Two shapes compare equal when every bound matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    pub dims: Vec<ArrayDim>,
}

impl ArrayShape {
    pub fn new(dims: Vec<ArrayDim>) -> Self {
        Self { dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total element count across all dimensions, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.dims.iter().map(ArrayDim::extent).fold(1, u64::saturating_mul)
    }

    /// Structural hash contribution of the shape
    pub fn hash_value(&self) -> u64 {
        self.dims.iter().fold(self.rank() as u64, |hash, dim| {
            hash.wrapping_mul(31)
                .wrapping_add(dim.lower as u64)
                .wrapping_mul(31)
                .wrapping_add(dim.upper as u64)
        })
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", dim.lower, dim.upper)?;
        }
        write!(f, ")")
    }
}
