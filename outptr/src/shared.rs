use crate::owner::{Deleter, Owner, Reset};
use crate::pointer::{PointerCast, RawPointer};
use crate::protocol::DefaultOut;
use crate::resolve::ResolveOut;
use crate::simple::OutPtr;
use std::rc::Rc;

struct Shared<P: RawPointer> {
    ptr: P,
    deleter: Box<dyn Deleter<P>>,
}

impl<P: RawPointer> Drop for Shared<P> {
    fn drop(&mut self) {
        // SAFETY: the last SharedHandle referring to ptr is gone
        unsafe { self.deleter.delete(self.ptr) };
    }
}

/// SharedHandle is a reference-counted owner of a C resource.  The resource is freed by its
/// deleter when the last clone of the handle is dropped.
///
/// The deleter is stored alongside the resource, not in the handle type, so every reset must
/// supply a new one.  Accordingly, adapting a `SharedHandle` to an output parameter requires a
/// deleter ([`crate::out_ptr_with`]), and input/output adaptation is not available at all: the C
/// function would free a resource that other clones may still be using.
///
/// ```
/// # use ffizz_outptr::{out_ptr_with, OutAdaptor, SharedHandle};
/// unsafe extern "C" fn conn_open(out: *mut *mut u32) -> i32 {
///     unsafe { *out = Box::into_raw(Box::new(5432)) };
///     0
/// }
/// fn conn_close(c: *mut u32) {
///     drop(unsafe { Box::from_raw(c) });
/// }
///
/// let mut conn: SharedHandle<*mut u32> = SharedHandle::default();
/// unsafe { conn_open(out_ptr_with(&mut conn, conn_close as fn(*mut u32)).as_mut_ptr()) };
/// let conn2 = conn.clone();
/// assert_eq!(conn2.use_count(), 2);
/// assert_eq!(unsafe { *conn2.get() }, 5432);
/// ```
pub struct SharedHandle<P: RawPointer> {
    inner: Option<Rc<Shared<P>>>,
}

impl<P: RawPointer> SharedHandle<P> {
    /// Take ownership of `ptr`, to be freed by `deleter` once all clones are dropped.
    ///
    /// A NULL `ptr` results in an empty handle, and `deleter` is dropped unused.
    ///
    /// # Safety
    ///
    /// * `ptr` must be NULL or a valid resource that `deleter` can free.
    /// * `ptr` must not be owned by anything else.
    pub unsafe fn from_raw<D: Deleter<P> + 'static>(ptr: P, deleter: D) -> Self {
        if ptr.is_null() {
            return Self::default();
        }
        SharedHandle {
            inner: Some(Rc::new(Shared {
                ptr,
                deleter: Box::new(deleter),
            })),
        }
    }

    /// Get the shared pointer, without affecting ownership.
    pub fn get(&self) -> P {
        self.inner.as_ref().map_or_else(P::null, |s| s.ptr)
    }

    /// Check whether the handle is empty.
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Get the number of handles sharing the resource (zero for an empty handle).
    pub fn use_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Rc::strong_count)
    }
}

impl<P: RawPointer> Default for SharedHandle<P> {
    fn default() -> Self {
        SharedHandle { inner: None }
    }
}

impl<P: RawPointer> Clone for SharedHandle<P> {
    fn clone(&self) -> Self {
        SharedHandle {
            inner: self.inner.clone(),
        }
    }
}

impl<P: RawPointer> Owner for SharedHandle<P> {
    type Pointer = P;

    fn get(&self) -> P {
        SharedHandle::get(self)
    }
}

impl<P: RawPointer, D: Deleter<P> + 'static> Reset<(D,)> for SharedHandle<P> {
    unsafe fn reset(&mut self, ptr: P, (deleter,): (D,)) {
        // SAFETY: see docstring
        *self = unsafe { SharedHandle::from_raw(ptr, deleter) };
    }
}

impl<P0, D, P> ResolveOut<P, (D,)> for SharedHandle<P0>
where
    P0: RawPointer,
    D: Deleter<P0> + 'static,
    P: PointerCast<P0>,
{
    type Adaptor<'a> = OutPtr<'a, Self, P, (D,), DefaultOut> where Self: 'a;
}
