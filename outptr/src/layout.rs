use crate::error::LayoutError;
use crate::owner::AliasedStorage;
use crate::pointer::PointerCast;
use std::mem;
use std::ptr;

/// Determine whether the pointer storage of `owner` can be written directly as a `P`, returning
/// its byte offset within the owner.
///
/// The checks are, in order:
///
/// * `P` must be exactly as wide as the owner's pointer type.
/// * The conversion from `P` must be a reinterpretation ([`crate::PointerCast::BITWISE`]), since
///   whatever C writes is never passed through `cast_to`.
/// * An owner no larger than `P` is aliased at offset 0; any other owner at its
///   [`AliasedStorage::STORAGE_OFFSET`].
/// * The storage must lie within the owner and be aligned for `P`.
/// * The value currently in the storage must equal [`crate::Owner::get`].
///
/// The last check guards against a wrong `AliasedStorage` implementation and yields
/// [`LayoutError::Mismatch`]; the others just indicate that aliasing is not possible for this
/// combination of types.
pub fn probe<S, P>(owner: &mut S) -> Result<usize, LayoutError>
where
    S: AliasedStorage,
    P: PointerCast<S::Pointer>,
{
    let width = mem::size_of::<P>();
    let size = mem::size_of::<S>();
    if width != mem::size_of::<S::Pointer>() {
        return Err(LayoutError::IncompatibleWidth {
            requested: width,
            stored: mem::size_of::<S::Pointer>(),
        });
    }

    if P::BITWISE.is_none() {
        return Err(LayoutError::NotBitwise {
            requested: std::any::type_name::<P>(),
            stored: std::any::type_name::<S::Pointer>(),
        });
    }

    let offset = if size <= width { 0 } else { S::STORAGE_OFFSET };
    if offset + width > size {
        return Err(LayoutError::OutOfBounds { offset, size });
    }

    // SAFETY: offset + width <= size_of::<S>() (just checked)
    let target = unsafe { storage_ptr::<S, P>(owner, offset) };
    if target as usize % mem::align_of::<P>() != 0 {
        return Err(LayoutError::Misaligned {
            offset,
            align: mem::align_of::<P>(),
        });
    }

    // SAFETY:
    // - target is in bounds and aligned (checked above)
    // - the bytes are initialized, as they are part of a live S
    // - any bit pattern is a valid P (RawPointer contract)
    let aliased = unsafe { ptr::read(target) };
    if aliased != P::cast_from(owner.get()) {
        return Err(LayoutError::Mismatch { offset });
    }

    Ok(offset)
}

/// Compute the address `offset` bytes into `owner`, typed as a `P`.
///
/// # Safety
///
/// * `offset + size_of::<P>()` must not exceed `size_of::<S>()`.
pub(crate) unsafe fn storage_ptr<S, P>(owner: &mut S, offset: usize) -> *mut P {
    // SAFETY: the result is within the bounds of *owner (see docstring)
    unsafe { (owner as *mut S).cast::<u8>().add(offset).cast::<P>() }
}

/// Probe for aliasing as the fast adaptors want it: `None` when aliasing is unavailable (or
/// disabled by configuration), and a panic when the owner's claimed layout is wrong.
pub(crate) fn alias_offset<S, P>(owner: &mut S) -> Option<usize>
where
    S: AliasedStorage,
    P: PointerCast<S::Pointer>,
{
    if !cfg!(feature = "fast") {
        return None;
    }

    match probe::<S, P>(owner) {
        Ok(offset) => Some(offset),
        Err(err @ LayoutError::Mismatch { .. }) => {
            tracing::error!(
                owner = std::any::type_name::<S>(),
                pointer = std::any::type_name::<P>(),
                error = %err,
                "owner layout does not match its AliasedStorage impl"
            );
            panic!("{}", err);
        }
        Err(err) => {
            tracing::trace!(
                owner = std::any::type_name::<S>(),
                pointer = std::any::type_name::<P>(),
                reason = %err,
                "cannot alias owner storage, using a separate slot"
            );
            None
        }
    }
}
