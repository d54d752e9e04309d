//! FakeAPI -- resources created through output parameters.
//!
//! Every allocation made by this library is counted, per thread, so that tests can check for
//! leaks with [`fakeapi_live_allocations`] and for double frees with [`fakeapi_over_frees`].
#![allow(non_camel_case_types)]
#![warn(unsafe_op_in_unsafe_fn)]

use libc::{c_int, c_void, size_t};
use std::cell::Cell;
use std::mem;

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
    static OVER_FREES: Cell<usize> = const { Cell::new(0) };
    static NEXT_FD: Cell<c_int> = const { Cell::new(3) };
}

fn allocated() {
    LIVE.with(|l| l.set(l.get() + 1));
}

// Unwinding out of an extern "C" function aborts, so an over-free is recorded rather than panicking.
fn freed() {
    let live = LIVE.with(|l| l.get());
    if live == 0 {
        OVER_FREES.with(|o| o.set(o.get() + 1));
    } else {
        LIVE.with(|l| l.set(live - 1));
    }
}

/// The value stored in every integer created by this library.
pub const FAKEAPI_DYNAMIC_DATA: c_int = 1024;

/// The kinds of resource that can be created with `fakeapi_create`.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum fakeapi_type_t {
    FAKEAPI_TYPE_INT = 0,
    FAKEAPI_TYPE_THING = 1,
}

/// A thing.  Things are allocated by Rust, so a Rust `Box<fakeapi_thing_t>` can own one.
#[repr(C)]
#[derive(Debug)]
pub struct fakeapi_thing_t {
    pub generation: u32,
}

impl fakeapi_thing_t {
    fn boxed(generation: u32) -> *mut fakeapi_thing_t {
        allocated();
        Box::into_raw(Box::new(fakeapi_thing_t { generation }))
    }
}

impl Drop for fakeapi_thing_t {
    fn drop(&mut self) {
        freed();
    }
}

/// Get the number of resources allocated on this thread and not yet freed.
#[no_mangle]
pub extern "C" fn fakeapi_live_allocations() -> size_t {
    LIVE.with(|l| l.get())
}

/// Get the number of frees on this thread that did not match an allocation.  This is nonzero after
/// a double free.
#[no_mangle]
pub extern "C" fn fakeapi_over_frees() -> size_t {
    OVER_FREES.with(|o| o.get())
}

/// Allocate a new integer containing FAKEAPI_DYNAMIC_DATA.  The result must be freed with
/// `fakeapi_int_delete`.  Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_int_create(out: *mut *mut c_int) -> c_int {
    if out.is_null() {
        return 1;
    }
    // SAFETY: malloc has no preconditions
    let p = unsafe { libc::malloc(mem::size_of::<c_int>()) } as *mut c_int;
    if p.is_null() {
        return 2;
    }
    allocated();
    // SAFETY:
    // - p was just allocated with room for a c_int
    // - out is not NULL (checked above) and points to a pointer (see docstring)
    unsafe {
        *p = FAKEAPI_DYNAMIC_DATA;
        *out = p;
    }
    0
}

/// Like `fakeapi_int_create`, but if `fail` is true, write NULL to `out` and return 1.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_int_create_fail(out: *mut *mut c_int, fail: bool) -> c_int {
    if fail {
        if !out.is_null() {
            // SAFETY: out is not NULL and points to a pointer (see docstring)
            unsafe { *out = std::ptr::null_mut() };
        }
        return 1;
    }
    // SAFETY: same requirements as this function
    unsafe { fakeapi_int_create(out) }
}

/// Free the integer pointed to by `inout`, if any, and replace it with a newly allocated integer
/// containing the old value plus one (or FAKEAPI_DYNAMIC_DATA if there was no old value).
/// Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_int_recreate(inout: *mut *mut c_int) -> c_int {
    if inout.is_null() {
        return 1;
    }
    // SAFETY: inout is not NULL (checked above)
    let old = unsafe { *inout };
    let value = if old.is_null() {
        FAKEAPI_DYNAMIC_DATA
    } else {
        // SAFETY: old was created by this library and is still live
        let v = unsafe { *old };
        unsafe { fakeapi_int_delete(old) };
        v + 1
    };
    // SAFETY: inout is not NULL (checked above)
    let rv = unsafe { fakeapi_int_create(inout) };
    if rv == 0 {
        // SAFETY: fakeapi_int_create just wrote a valid pointer
        unsafe { **inout = value };
    }
    rv
}

/// Free an integer created by this library.  NULL is ignored.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_int_delete(p: *mut c_int) {
    if p.is_null() {
        return;
    }
    freed();
    // SAFETY: p was allocated with malloc by fakeapi_int_create
    unsafe { libc::free(p as *mut c_void) };
}

/// Allocate a resource of the given kind, returning it as an untyped pointer.  It must be freed
/// with `fakeapi_delete` and the same kind.  Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_create(out: *mut *mut c_void, kind: fakeapi_type_t) -> c_int {
    match kind {
        // SAFETY: same requirements as this function
        fakeapi_type_t::FAKEAPI_TYPE_INT => unsafe { fakeapi_int_create(out as *mut *mut c_int) },
        // SAFETY: same requirements as this function
        fakeapi_type_t::FAKEAPI_TYPE_THING => unsafe {
            fakeapi_thing_create(out as *mut *mut fakeapi_thing_t)
        },
    }
}

/// Free a resource created with `fakeapi_create`.  NULL is ignored.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_delete(p: *mut c_void, kind: fakeapi_type_t) {
    match kind {
        // SAFETY: same requirements as this function
        fakeapi_type_t::FAKEAPI_TYPE_INT => unsafe { fakeapi_int_delete(p as *mut c_int) },
        // SAFETY: same requirements as this function
        fakeapi_type_t::FAKEAPI_TYPE_THING => unsafe {
            fakeapi_thing_free(p as *mut fakeapi_thing_t)
        },
    }
}

/// Free an untyped integer created with `fakeapi_create(.., FAKEAPI_TYPE_INT)`.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_void_int_delete(p: *mut c_void) {
    // SAFETY: same requirements as this function
    unsafe { fakeapi_delete(p, fakeapi_type_t::FAKEAPI_TYPE_INT) }
}

/// Create a new thing, of generation zero.  Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_thing_create(out: *mut *mut fakeapi_thing_t) -> c_int {
    if out.is_null() {
        return 1;
    }
    // SAFETY: out is not NULL and points to a pointer (see docstring)
    unsafe { *out = fakeapi_thing_t::boxed(0) };
    0
}

/// Replace the thing pointed to by `inout` with one of the next generation, freeing the old one.
/// If `*inout` is NULL, create a thing of generation zero.  Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_thing_recreate(inout: *mut *mut fakeapi_thing_t) -> c_int {
    if inout.is_null() {
        return 1;
    }
    // SAFETY: inout is not NULL (checked above)
    let old = unsafe { *inout };
    let generation = if old.is_null() {
        0
    } else {
        // SAFETY: old was created by this library and is still live
        unsafe { Box::from_raw(old) }.generation + 1
    };
    // SAFETY: inout is not NULL (checked above)
    unsafe { *inout = fakeapi_thing_t::boxed(generation) };
    0
}

/// Free a thing.  NULL is ignored.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_thing_free(thing: *mut fakeapi_thing_t) {
    if !thing.is_null() {
        // SAFETY: thing was created by this library and is still live
        drop(unsafe { Box::from_raw(thing) });
    }
}

/// Open a new file descriptor, writing it to `out`.  Descriptors are small integers, and -1 means
/// "no descriptor".  Returns zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_fd_open(out: *mut c_int) -> c_int {
    if out.is_null() {
        return 1;
    }
    let fd = NEXT_FD.with(|n| {
        let fd = n.get();
        n.set(fd + 1);
        fd
    });
    allocated();
    // SAFETY: out is not NULL and points to an int (see docstring)
    unsafe { *out = fd };
    0
}

/// Close the descriptor in `inout`, unless it is -1, and open a new one in its place.  Returns
/// zero on success.
#[no_mangle]
pub unsafe extern "C" fn fakeapi_fd_reopen(inout: *mut c_int) -> c_int {
    if inout.is_null() {
        return 1;
    }
    // SAFETY: inout is not NULL (checked above)
    fakeapi_fd_close(unsafe { *inout });
    // SAFETY: same requirements as this function
    unsafe { fakeapi_fd_open(inout) }
}

/// Close a file descriptor.  -1 is ignored.
#[no_mangle]
pub extern "C" fn fakeapi_fd_close(fd: c_int) {
    if fd != -1 {
        freed();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::ptr;

    #[test]
    fn int_create_delete() {
        let mut p: *mut c_int = ptr::null_mut();
        assert_eq!(unsafe { fakeapi_int_create(&mut p) }, 0);
        assert_eq!(unsafe { *p }, FAKEAPI_DYNAMIC_DATA);
        assert_eq!(fakeapi_live_allocations(), 1);
        unsafe { fakeapi_int_delete(p) };
        assert_eq!(fakeapi_live_allocations(), 0);
    }

    #[test]
    fn int_create_fail() {
        let mut p: *mut c_int = 0x10 as *mut c_int;
        assert_eq!(unsafe { fakeapi_int_create_fail(&mut p, true) }, 1);
        assert!(p.is_null());
        assert_eq!(fakeapi_live_allocations(), 0);
    }

    #[test]
    fn int_recreate() {
        let mut p: *mut c_int = ptr::null_mut();
        assert_eq!(unsafe { fakeapi_int_recreate(&mut p) }, 0);
        assert_eq!(unsafe { fakeapi_int_recreate(&mut p) }, 0);
        assert_eq!(unsafe { *p }, FAKEAPI_DYNAMIC_DATA + 1);
        assert_eq!(fakeapi_live_allocations(), 1);
        unsafe { fakeapi_int_delete(p) };
    }

    #[test]
    fn things() {
        let mut t: *mut fakeapi_thing_t = ptr::null_mut();
        assert_eq!(unsafe { fakeapi_thing_create(&mut t) }, 0);
        assert_eq!(unsafe { fakeapi_thing_recreate(&mut t) }, 0);
        assert_eq!(unsafe { (*t).generation }, 1);
        assert_eq!(fakeapi_live_allocations(), 1);
        unsafe { fakeapi_thing_free(t) };
        assert_eq!(fakeapi_live_allocations(), 0);
    }

    #[test]
    fn fds() {
        let mut a = -1;
        let mut b = -1;
        unsafe {
            fakeapi_fd_open(&mut a);
            fakeapi_fd_open(&mut b);
        }
        assert_ne!(a, b);
        assert_eq!(fakeapi_live_allocations(), 2);
        fakeapi_fd_close(a);
        fakeapi_fd_close(b);
        fakeapi_fd_close(-1);
        assert_eq!(fakeapi_live_allocations(), 0);
    }

    #[test]
    fn fd_reopen() {
        let mut fd = -1;
        assert_eq!(unsafe { fakeapi_fd_reopen(&mut fd) }, 0);
        let first = fd;
        assert_eq!(unsafe { fakeapi_fd_reopen(&mut fd) }, 0);
        assert_ne!(fd, first);
        assert_eq!(fakeapi_live_allocations(), 1);
        fakeapi_fd_close(fd);
    }

    #[test]
    fn over_free_is_recorded() {
        let mut fd = -1;
        unsafe { fakeapi_fd_open(&mut fd) };
        fakeapi_fd_close(fd);
        assert_eq!(fakeapi_over_frees(), 0);
        fakeapi_fd_close(fd);
        assert_eq!(fakeapi_over_frees(), 1);
        assert_eq!(fakeapi_live_allocations(), 0);
    }
}
