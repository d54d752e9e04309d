use crate::fast::{AliasInOut, AliasOut};
use crate::owner::Owner;
use crate::pointer::{PointerCast, RawPointer};
use crate::protocol::{DefaultInOut, DefaultOut};
use crate::simple::OutPtr;
use std::ffi::c_void;

/// An adaptor that can be passed to a C function as an output parameter of type `*mut P`.
///
/// [`OutPtr`] is the implementation used by all built-in owners.  Owners needing complete control
/// over the transfer can implement this trait on their own type and name it in their
/// [`ResolveOut`] or [`ResolveInOut`] impl.
///
/// Implementations must commit the slot into the owner exactly once, in `Drop`.
pub trait OutAdaptor<'a, S: 'a, P, A>: Sized {
    /// Bind a new adaptor to `owner`, with the given extra reset arguments.
    fn new(owner: &'a mut S, args: A) -> Self;

    /// Get the address the C function should write its result to.
    ///
    /// The address is valid until the next call to `as_mut_ptr` (or `as_void_ptr`), or until the
    /// adaptor is moved or dropped, whichever comes first.  Each call returns the same address,
    /// but only the most recently returned pointer may be used.
    fn as_mut_ptr(&mut self) -> *mut P;

    /// Get the address as a `void **`, for C APIs which return untyped pointers.
    fn as_void_ptr(&mut self) -> *mut *mut c_void {
        self.as_mut_ptr().cast()
    }

    /// Call `f` with the output parameter, then commit the result into the owner.
    ///
    /// The return value of `f` is passed through, so this works well with C functions returning
    /// a status code:
    ///
    /// ```
    /// # use ffizz_outptr::{out_ptr, OutAdaptor};
    /// # unsafe extern "C" fn thing_new(out: *mut *mut u32) -> i32 {
    /// #     unsafe { *out = Box::into_raw(Box::new(42)) };
    /// #     0
    /// # }
    /// let mut thing: Option<Box<u32>> = None;
    /// let rv = out_ptr(&mut thing).call(|out| unsafe { thing_new(out) });
    /// assert_eq!(rv, 0);
    /// assert_eq!(thing.as_deref(), Some(&42));
    /// ```
    fn call<R, F: FnOnce(*mut P) -> R>(mut self, f: F) -> R {
        f(self.as_mut_ptr())
    }

    /// Commit the result into the owner now, instead of at the end of the statement.
    fn commit(self) {
        drop(self)
    }
}

/// Select the output-only adaptor for this owner, requested pointer type `P`, and extra reset
/// arguments `A` (`()` or `(D,)`).
///
/// There is exactly one implementation for each combination, and it names one of:
///
/// 1. a custom [`OutAdaptor`] type (full override),
/// 2. an [`OutPtr`] with a custom [`crate::OwnershipTraits`] protocol (protocol override), or
/// 3. `OutPtr<'a, Self, P, A, DefaultOut>` (the default).
///
/// A combination without an implementation cannot be adapted, and using it is a compile-time
/// error.  For example, [`crate::SharedHandle`] only implements `ResolveOut<P, (D,)>`, since
/// resetting it requires a deleter.
pub trait ResolveOut<P: RawPointer, A = ()>: Owner + Sized {
    /// The adaptor type.
    type Adaptor<'a>: OutAdaptor<'a, Self, P, A>
    where
        Self: 'a;
}

/// Select the input/output adaptor for this owner, requested pointer type `P`, and extra reset
/// arguments `A` (`()` or `(D,)`).
///
/// As for [`ResolveOut`], but the C function receives the owner's current pointer and may
/// replace it.  Only owners that can release their pointer without freeing it implement this
/// trait; in particular, shared owners do not.
pub trait ResolveInOut<P: RawPointer, A = ()>: Owner + Sized {
    /// The adaptor type.
    type Adaptor<'a>: OutAdaptor<'a, Self, P, A>
    where
        Self: 'a;
}

/// Adapt `owner` to a C output parameter of the owner's own pointer type.
///
/// Whatever the owner held before is freed, and the owner takes ownership of what the C function
/// writes.  If the C function writes nothing, the owner is left empty.
///
/// ```
/// # use ffizz_outptr::{out_ptr, OutAdaptor};
/// /// Allocate a new counter, returning zero on success.
/// unsafe extern "C" fn counter_new(out: *mut *mut u64) -> i32 {
///     unsafe { *out = Box::into_raw(Box::new(0)) };
///     0
/// }
///
/// let mut counter: Option<Box<u64>> = None;
/// if unsafe { counter_new(out_ptr(&mut counter).as_mut_ptr()) } != 0 {
///     panic!("could not allocate counter");
/// }
/// assert_eq!(counter.as_deref(), Some(&0));
/// ```
pub fn out_ptr<'a, S>(owner: &'a mut S) -> <S as ResolveOut<S::Pointer>>::Adaptor<'a>
where
    S: ResolveOut<<S as Owner>::Pointer>,
{
    out_ptr_as_with::<S::Pointer, S, ()>(owner, ())
}

/// Adapt `owner` to a C output parameter, installing `deleter` along with the new pointer.
///
/// This is required for owners which do not keep their deleter across a reset:
///
/// ```compile_fail
/// # use ffizz_outptr::{out_ptr, SharedHandle};
/// let mut shared: SharedHandle<*mut u8> = SharedHandle::default();
/// // error: a SharedHandle must be given a deleter
/// let _ = out_ptr(&mut shared);
/// ```
pub fn out_ptr_with<'a, S, D>(
    owner: &'a mut S,
    deleter: D,
) -> <S as ResolveOut<S::Pointer, (D,)>>::Adaptor<'a>
where
    S: ResolveOut<<S as Owner>::Pointer, (D,)>,
{
    out_ptr_as_with::<S::Pointer, S, (D,)>(owner, (deleter,))
}

/// Adapt `owner` to a C output parameter of type `*mut P`, where `P` may differ from the owner's
/// pointer type (most often, `P` is `*mut c_void`).
///
/// If `P` does not have the same width as the owner's pointer, the adaptor uses a separate slot
/// and converts the value at write-back.
pub fn out_ptr_as<'a, P, S>(owner: &'a mut S) -> <S as ResolveOut<P>>::Adaptor<'a>
where
    P: RawPointer,
    S: ResolveOut<P>,
{
    out_ptr_as_with::<P, S, ()>(owner, ())
}

/// Adapt `owner` to a C output parameter of type `*mut P`, with extra reset arguments `args`
/// (`()` or `(deleter,)`).
pub fn out_ptr_as_with<'a, P, S, A>(
    owner: &'a mut S,
    args: A,
) -> <S as ResolveOut<P, A>>::Adaptor<'a>
where
    P: RawPointer,
    S: ResolveOut<P, A>,
{
    <<S as ResolveOut<P, A>>::Adaptor<'a> as OutAdaptor<'a, S, P, A>>::new(owner, args)
}

/// Adapt `owner` to a C input/output parameter of the owner's own pointer type.
///
/// The C function receives the owner's current pointer, and may free it and write a new one.
/// The owner ends up owning whatever the parameter contains when the adaptor is dropped, and
/// never frees the original pointer itself.
///
/// Shared owners cannot be used this way, since the C function would free a pointer other owners
/// still use:
///
/// ```compile_fail
/// # use ffizz_outptr::{inout_ptr, SharedHandle};
/// let mut shared: SharedHandle<*mut u8> = SharedHandle::default();
/// // error: SharedHandle does not implement ResolveInOut
/// let _ = inout_ptr(&mut shared);
/// ```
///
/// ```compile_fail
/// # use ffizz_outptr::{inout_ptr_with, SharedHandle};
/// fn free_u8(p: *mut u8) {}
/// let mut shared: SharedHandle<*mut u8> = SharedHandle::default();
/// // error: not even with a deleter
/// let _ = inout_ptr_with(&mut shared, free_u8 as fn(*mut u8));
/// ```
pub fn inout_ptr<'a, S>(owner: &'a mut S) -> <S as ResolveInOut<S::Pointer>>::Adaptor<'a>
where
    S: ResolveInOut<<S as Owner>::Pointer>,
{
    inout_ptr_as_with::<S::Pointer, S, ()>(owner, ())
}

/// Adapt `owner` to a C input/output parameter, installing `deleter` along with the new pointer.
pub fn inout_ptr_with<'a, S, D>(
    owner: &'a mut S,
    deleter: D,
) -> <S as ResolveInOut<S::Pointer, (D,)>>::Adaptor<'a>
where
    S: ResolveInOut<<S as Owner>::Pointer, (D,)>,
{
    inout_ptr_as_with::<S::Pointer, S, (D,)>(owner, (deleter,))
}

/// Adapt `owner` to a C input/output parameter of type `*mut P`.
pub fn inout_ptr_as<'a, P, S>(owner: &'a mut S) -> <S as ResolveInOut<P>>::Adaptor<'a>
where
    P: RawPointer,
    S: ResolveInOut<P>,
{
    inout_ptr_as_with::<P, S, ()>(owner, ())
}

/// Adapt `owner` to a C input/output parameter of type `*mut P`, with extra reset arguments
/// `args` (`()` or `(deleter,)`).
pub fn inout_ptr_as_with<'a, P, S, A>(
    owner: &'a mut S,
    args: A,
) -> <S as ResolveInOut<P, A>>::Adaptor<'a>
where
    P: RawPointer,
    S: ResolveInOut<P, A>,
{
    <<S as ResolveInOut<P, A>>::Adaptor<'a> as OutAdaptor<'a, S, P, A>>::new(owner, args)
}

impl<T, P: PointerCast<*mut T>> ResolveOut<P> for Option<Box<T>> {
    type Adaptor<'a> = OutPtr<'a, Self, P, (), AliasOut> where Self: 'a;
}

impl<T, P: PointerCast<*mut T>> ResolveInOut<P> for Option<Box<T>> {
    type Adaptor<'a> = OutPtr<'a, Self, P, (), AliasInOut> where Self: 'a;
}

impl<T, P: PointerCast<*mut T>> ResolveOut<P> for *mut T {
    type Adaptor<'a> = OutPtr<'a, Self, P, (), DefaultOut> where Self: 'a;
}

impl<T, P: PointerCast<*mut T>> ResolveInOut<P> for *mut T {
    type Adaptor<'a> = OutPtr<'a, Self, P, (), DefaultInOut> where Self: 'a;
}
