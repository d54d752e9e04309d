use crate::fast::{AliasInOut, AliasOut};
use crate::owner::{AliasedStorage, Deleter, HasDeleter, Owner, Release, Reset};
use crate::pointer::{PointerCast, RawPointer};
use crate::protocol::{DefaultInOut, DefaultOut};
use crate::resolve::{ResolveInOut, ResolveOut};
use crate::simple::OutPtr;
use std::mem;

/// Handle is a unique owner of a C resource, freed with a deleter of type `D`.
///
/// The resource is usually a pointer, but any [`RawPointer`] works, such as a file descriptor
/// newtype with `-1` as its NULL value.  This is the Rust counterpart of a C++
/// `std::unique_ptr<T, D>`.
///
/// # Example
///
/// ```
/// # use ffizz_outptr::{out_ptr, Handle, OutAdaptor};
/// unsafe extern "C" fn widget_new(out: *mut *mut u32) -> i32 {
///     unsafe { *out = Box::into_raw(Box::new(7)) };
///     0
/// }
/// unsafe extern "C" fn widget_free(w: *mut u32) {
///     drop(unsafe { Box::from_raw(w) });
/// }
///
/// let mut widget: Handle<*mut u32, _> = Handle::null(widget_free as unsafe extern "C" fn(*mut u32));
/// assert_eq!(unsafe { widget_new(out_ptr(&mut widget).as_mut_ptr()) }, 0);
/// assert_eq!(unsafe { *widget.get() }, 7);
/// // widget_free is called when `widget` is dropped
/// ```
///
/// With no extra arguments, adaptors for a `Handle` write directly into its pointer field.  When
/// a deleter is supplied (`out_ptr_with`), the handle is rebuilt with the new deleter at
/// write-back, and the previous pointer is freed with the previous deleter.
pub struct Handle<P: RawPointer, D: Deleter<P>> {
    ptr: P,
    deleter: D,
}

impl<P: RawPointer, D: Deleter<P>> Handle<P, D> {
    /// Create an empty handle which will use the given deleter.
    pub fn null(deleter: D) -> Self {
        Handle {
            ptr: P::null(),
            deleter,
        }
    }

    /// Take ownership of `ptr`.
    ///
    /// # Safety
    ///
    /// * `ptr` must be NULL or a valid resource that `deleter` can free.
    /// * `ptr` must not be owned by anything else.
    pub unsafe fn from_raw(ptr: P, deleter: D) -> Self {
        Handle { ptr, deleter }
    }

    /// Get the owned pointer, without affecting ownership.
    pub fn get(&self) -> P {
        self.ptr
    }

    /// Check whether the handle is empty.
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Get the deleter.
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Get the deleter, mutably.
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Give up ownership of the pointer, leaving the handle empty.  The caller becomes
    /// responsible for freeing the returned pointer.
    pub fn release(&mut self) -> P {
        mem::replace(&mut self.ptr, P::null())
    }

    /// Free the current pointer, if any, and take ownership of `ptr`.
    ///
    /// # Safety
    ///
    /// * `ptr` must be NULL or a valid resource that this handle's deleter can free.
    /// * `ptr` must not be owned by anything else.
    pub unsafe fn reset(&mut self, ptr: P) {
        let old = mem::replace(&mut self.ptr, ptr);
        if !old.is_null() {
            // SAFETY: old was owned by this handle
            unsafe { self.deleter.delete(old) };
        }
    }
}

impl<P: RawPointer, D: Deleter<P> + Default> Default for Handle<P, D> {
    fn default() -> Self {
        Handle::null(D::default())
    }
}

impl<P: RawPointer, D: Deleter<P>> Drop for Handle<P, D> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: ptr is owned by this handle, and is not used again
            unsafe { self.deleter.delete(self.ptr) };
        }
    }
}

impl<P: RawPointer, D: Deleter<P>> Owner for Handle<P, D> {
    type Pointer = P;

    fn get(&self) -> P {
        self.ptr
    }
}

impl<P: RawPointer, D: Deleter<P>> Release for Handle<P, D> {
    fn release(&mut self) -> P {
        Handle::release(self)
    }
}

impl<P: RawPointer, D: Deleter<P>> Reset for Handle<P, D> {
    unsafe fn reset(&mut self, ptr: P, _args: ()) {
        // SAFETY: see docstring
        unsafe { Handle::reset(self, ptr) };
    }
}

impl<P: RawPointer, D: Deleter<P>> Reset<(D,)> for Handle<P, D> {
    unsafe fn reset(&mut self, ptr: P, (deleter,): (D,)) {
        // dropping the old handle frees its pointer with its own deleter
        // SAFETY: see docstring
        *self = unsafe { Handle::from_raw(ptr, deleter) };
    }
}

impl<P: RawPointer, D: Deleter<P>> HasDeleter for Handle<P, D> {
    type Deleter = D;

    fn deleter(&self) -> &D {
        &self.deleter
    }
}

// SAFETY:
// - ptr is a plain field at this offset, and Owner::get returns it
// - release() stores NULL there
// - the handle owns whatever is in ptr, with no other bookkeeping
unsafe impl<P: RawPointer, D: Deleter<P>> AliasedStorage for Handle<P, D> {
    const STORAGE_OFFSET: usize = mem::offset_of!(Handle<P, D>, ptr);
}

impl<P0, D, P> ResolveOut<P> for Handle<P0, D>
where
    P0: RawPointer,
    D: Deleter<P0>,
    P: PointerCast<P0>,
{
    type Adaptor<'a> = OutPtr<'a, Self, P, (), AliasOut> where Self: 'a;
}

impl<P0, D, P> ResolveOut<P, (D,)> for Handle<P0, D>
where
    P0: RawPointer,
    D: Deleter<P0>,
    P: PointerCast<P0>,
{
    type Adaptor<'a> = OutPtr<'a, Self, P, (D,), DefaultOut> where Self: 'a;
}

impl<P0, D, P> ResolveInOut<P> for Handle<P0, D>
where
    P0: RawPointer,
    D: Deleter<P0>,
    P: PointerCast<P0>,
{
    type Adaptor<'a> = OutPtr<'a, Self, P, (), AliasInOut> where Self: 'a;
}

impl<P0, D, P> ResolveInOut<P, (D,)> for Handle<P0, D>
where
    P0: RawPointer,
    D: Deleter<P0>,
    P: PointerCast<P0>,
{
    type Adaptor<'a> = OutPtr<'a, Self, P, (D,), DefaultInOut> where Self: 'a;
}
