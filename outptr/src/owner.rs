use crate::pointer::RawPointer;
use std::mem;
use std::ptr;

/// An owning wrapper around a single C resource handle.
///
/// This is the minimal capability every owner must have: reading back the handle it currently
/// holds.  The other capabilities ([`Release`], [`Reset`], [`HasDeleter`], [`AliasedStorage`])
/// are separate traits, and the adaptors available for an owner depend on which of them it
/// implements.
pub trait Owner {
    /// The pointer (or handle) type stored by this owner.
    type Pointer: RawPointer;

    /// Get the currently-held pointer, or NULL if the owner is empty.  Ownership is unchanged.
    fn get(&self) -> Self::Pointer;
}

/// Owners that can give up their handle without freeing it.
///
/// This is required for input/output adaptation, where the C function consumes the handle
/// passed in.  Owners with shared ownership must not implement this trait, as other owners may
/// still refer to the handle.
pub trait Release: Owner {
    /// Return the current pointer and leave the owner empty, without freeing anything.
    fn release(&mut self) -> Self::Pointer;
}

/// Owners that can take responsibility for a new handle, given zero or one extra arguments.
///
/// `A` is `()` for a plain reset, or `(D,)` for a reset that also installs deleter `D`.  An owner
/// that cannot sensibly be reset without a deleter (such as [`crate::SharedHandle`]) simply does
/// not implement `Reset<()>`.
pub trait Reset<A = ()>: Owner {
    /// Free any currently-held handle and take ownership of `ptr`.
    ///
    /// Implementations may replace the handle in place, or rebuild the owner from scratch; either
    /// way the previous handle is freed exactly once.
    ///
    /// # Safety
    ///
    /// * `ptr` must be NULL, or a handle that this owner (with the deleter it will have after
    ///   this call) may free.
    /// * `ptr` must not be owned by anything else.
    unsafe fn reset(&mut self, ptr: Self::Pointer, args: A);
}

/// A function freeing C resources of type `P`.
pub trait Deleter<P> {
    /// Free the resource.
    ///
    /// # Safety
    ///
    /// * `ptr` must be a valid, non-NULL resource appropriate for this deleter.
    /// * `ptr` must not be used after this call.
    unsafe fn delete(&self, ptr: P);
}

impl<P> Deleter<P> for fn(P) {
    unsafe fn delete(&self, ptr: P) {
        (*self)(ptr)
    }
}

impl<P> Deleter<P> for unsafe extern "C" fn(P) {
    unsafe fn delete(&self, ptr: P) {
        // SAFETY: see docstring
        unsafe { (*self)(ptr) }
    }
}

impl<P, D: Deleter<P> + ?Sized> Deleter<P> for &D {
    unsafe fn delete(&self, ptr: P) {
        // SAFETY: see docstring
        unsafe { (**self).delete(ptr) }
    }
}

impl<P, D: Deleter<P> + ?Sized> Deleter<P> for Box<D> {
    unsafe fn delete(&self, ptr: P) {
        // SAFETY: see docstring
        unsafe { (**self).delete(ptr) }
    }
}

/// A deleter for pointers returned from `Box::into_raw`.
#[derive(Clone, Copy, Default, Debug)]
pub struct DropBox;

impl<T> Deleter<*mut T> for DropBox {
    unsafe fn delete(&self, ptr: *mut T) {
        // SAFETY: ptr came from Box::into_raw (see docstring of Deleter::delete)
        drop(unsafe { Box::from_raw(ptr) });
    }
}

/// Owners which free their handle with a deleter that can be queried.
pub trait HasDeleter: Owner {
    /// The deleter type.
    type Deleter: Deleter<Self::Pointer>;

    /// Get a reference to the deleter that will free the current handle.
    fn deleter(&self) -> &Self::Deleter;
}

/// Owners whose pointer storage may be written directly by C code.
///
/// Implementing this trait opts the owner into the aliasing adaptors, which hand C a pointer into
/// the owner itself instead of into a temporary slot, skipping the final copy.
///
/// # Safety
///
/// * The owner must contain a `Self::Pointer` at byte offset `STORAGE_OFFSET`, and that value
///   must always equal what [`Owner::get`] returns.
/// * After [`Release::release`], the storage must contain NULL.
/// * Writing any valid handle (as defined by [`Reset::reset`]) into the storage of a released
///   owner must leave the owner owning that handle, exactly as if it had been reset.
pub unsafe trait AliasedStorage: Release {
    /// Byte offset of the pointer storage within `Self`.
    const STORAGE_OFFSET: usize;
}

// Option<Box<T>> is the natural Rust owner for a pointer allocated by Rust and handed out to C.

impl<T> Owner for Option<Box<T>> {
    type Pointer = *mut T;

    fn get(&self) -> *mut T {
        match self {
            Some(b) => &**b as *const T as *mut T,
            None => ptr::null_mut(),
        }
    }
}

impl<T> Release for Option<Box<T>> {
    fn release(&mut self) -> *mut T {
        self.take().map_or(ptr::null_mut(), Box::into_raw)
    }
}

impl<T> Reset for Option<Box<T>> {
    unsafe fn reset(&mut self, ptr: *mut T, _args: ()) {
        *self = if ptr.is_null() {
            None
        } else {
            // SAFETY: ptr came from Box::into_raw (see docstring)
            Some(unsafe { Box::from_raw(ptr) })
        };
    }
}

impl<T> HasDeleter for Option<Box<T>> {
    type Deleter = DropBox;

    fn deleter(&self) -> &DropBox {
        &DropBox
    }
}

// SAFETY:
// - Option<Box<T>> for sized T is guaranteed to have the same layout as *mut T, with None
//   represented as NULL
// - release() stores None
unsafe impl<T> AliasedStorage for Option<Box<T>> {
    const STORAGE_OFFSET: usize = 0;
}

// A bare raw pointer "owns" nothing: reset simply overwrites it, and nothing is ever freed.

impl<T> Owner for *mut T {
    type Pointer = *mut T;

    fn get(&self) -> *mut T {
        *self
    }
}

impl<T> Release for *mut T {
    fn release(&mut self) -> *mut T {
        mem::replace(self, ptr::null_mut())
    }
}

impl<T> Reset for *mut T {
    unsafe fn reset(&mut self, ptr: *mut T, _args: ()) {
        *self = ptr;
    }
}
