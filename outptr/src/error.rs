use thiserror::Error;

/// LayoutError indicates that an owner's pointer storage cannot be aliased by the requested
/// pointer type.
///
/// All variants except `Mismatch` simply mean the aliasing adaptors must fall back to a separate
/// slot.  `Mismatch` means an [`crate::AliasedStorage`] implementation is wrong, and writing
/// through the computed address would corrupt memory.
#[derive(Error, Eq, PartialEq, Debug)]
pub enum LayoutError {
    #[error("requested pointer is {requested} bytes but the owner stores {stored} bytes")]
    IncompatibleWidth { requested: usize, stored: usize },

    #[error("conversion from {requested} to {stored} does not preserve the representation")]
    NotBitwise {
        requested: &'static str,
        stored: &'static str,
    },

    #[error("pointer storage at offset {offset} does not fit in an owner of {size} bytes")]
    OutOfBounds { offset: usize, size: usize },

    #[error("pointer storage at offset {offset} is not aligned to {align} bytes")]
    Misaligned { offset: usize, align: usize },

    #[error("pointer storage at offset {offset} does not contain the owner's pointer")]
    Mismatch { offset: usize },
}
