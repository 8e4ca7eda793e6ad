//! Error handling.

use core::alloc::LayoutError;
use core::fmt;

/// An enumeration of error types raised by proxy operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyError {
    /// A memory allocation failed
    AllocError,
    /// The underlying allocator reported a failure while releasing a block
    ReleaseError,
    /// A null source pointer was supplied for a non-zero element count
    NullSource,
    /// A length computation overflowed the addressable range
    CapacityLimit,
    /// The requested size was not representable as an allocation layout
    LayoutError(LayoutError),
}

impl ProxyError {
    /// Generic description of this error
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllocError => "Allocation error",
            Self::ReleaseError => "Release error",
            Self::NullSource => "Null source pointer",
            Self::CapacityLimit => "Exceeded addressable capacity limit",
            Self::LayoutError(_) => "Layout error",
        }
    }

    /// Generate a panic with this error as the reason
    #[cold]
    #[inline(never)]
    pub fn panic(self) -> ! {
        panic!("{}", self.as_str());
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LayoutError> for ProxyError {
    fn from(err: LayoutError) -> Self {
        Self::LayoutError(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProxyError {}
