/// Make the entry functions ([`crate::out_ptr`] and friends) available for your own owner type,
/// using the default protocols.
///
/// Adaptor selection is done by [`crate::ResolveOut`] and [`crate::ResolveInOut`] impls, which
/// cannot be provided generically for every owner.  For a concrete owner type, this macro writes
/// them for you:
///
/// ```ignore
/// ffizz_outptr::default_resolve!(MyOwner);      // out_ptr and inout_ptr (needs Release)
/// ffizz_outptr::default_resolve!(out MyOwner);  // out_ptr only
/// ffizz_outptr::default_resolve!(inout MyOwner); // inout_ptr only
/// ```
///
/// Output adaptation requires `MyOwner: Reset`, and input/output adaptation also requires
/// `MyOwner: Release`.  Every requested pointer type convertible to the owner's pointer type
/// (`_as` variants) is covered.
///
/// ```
/// # use ffizz_outptr::{out_ptr, Owner, Release, Reset, OutAdaptor};
/// # use std::ptr;
/// /// Holds a pointer it never frees.
/// #[derive(Default)]
/// struct Borrowed(Option<*mut u32>);
///
/// impl Owner for Borrowed {
///     type Pointer = *mut u32;
///     fn get(&self) -> *mut u32 {
///         self.0.unwrap_or(ptr::null_mut())
///     }
/// }
/// impl Release for Borrowed {
///     fn release(&mut self) -> *mut u32 {
///         self.0.take().unwrap_or(ptr::null_mut())
///     }
/// }
/// impl Reset for Borrowed {
///     unsafe fn reset(&mut self, p: *mut u32, _args: ()) {
///         self.0 = if p.is_null() { None } else { Some(p) };
///     }
/// }
///
/// ffizz_outptr::default_resolve!(Borrowed);
///
/// static mut VALUE: u32 = 7;
/// let mut b = Borrowed::default();
/// unsafe { *out_ptr(&mut b).as_mut_ptr() = ptr::addr_of_mut!(VALUE) };
/// assert!(b.0.is_some());
/// ```
#[macro_export]
macro_rules! default_resolve(
    { out $owner:ty } => {
        impl<P> $crate::ResolveOut<P> for $owner
        where
            P: $crate::PointerCast<<$owner as $crate::Owner>::Pointer>,
        {
            type Adaptor<'a> = $crate::OutPtr<'a, Self, P, (), $crate::DefaultOut> where Self: 'a;
        }
    };
    { inout $owner:ty } => {
        impl<P> $crate::ResolveInOut<P> for $owner
        where
            P: $crate::PointerCast<<$owner as $crate::Owner>::Pointer>,
        {
            type Adaptor<'a> = $crate::OutPtr<'a, Self, P, (), $crate::DefaultInOut> where Self: 'a;
        }
    };
    { $owner:ty } => {
        $crate::default_resolve!(out $owner);
        $crate::default_resolve!(inout $owner);
    };
);
