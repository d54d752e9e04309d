use std::ptr;

/// A value that can be passed through a C "output parameter": usually a raw pointer, but handle
/// types such as file descriptors work too, as long as they have a distinguished NULL value.
///
/// # Safety
///
/// Adaptors may read and write values of this type directly in the memory of an owner, so
/// implementors must guarantee:
///
/// * every bit pattern of `size_of::<Self>()` bytes is a valid value of the type (it is "plain old
///   data"), and
/// * [`RawPointer::null`] returns the value the C API uses to mean "no resource".
pub unsafe trait RawPointer: Copy + PartialEq {
    /// The value representing "no resource".
    fn null() -> Self;

    /// Check whether this is the NULL value.
    fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

// SAFETY: raw pointers are plain data, and NULL is the C convention for "nothing"
unsafe impl<T> RawPointer for *mut T {
    fn null() -> Self {
        ptr::null_mut()
    }

    fn is_null(&self) -> bool {
        <*mut T>::is_null(*self)
    }
}

// SAFETY: raw pointers are plain data, and NULL is the C convention for "nothing"
unsafe impl<T> RawPointer for *const T {
    fn null() -> Self {
        ptr::null()
    }

    fn is_null(&self) -> bool {
        <*const T>::is_null(*self)
    }
}

/// Evidence that a [`PointerCast`] conversion leaves the bits unchanged.
///
/// The aliasing adaptors let C write a `P` directly into an owner's storage, skipping
/// [`PointerCast::cast_to`].  That is only equivalent to the default adaptors when the conversion
/// is a plain reinterpretation, which a `PointerCast` impl declares by setting
/// [`PointerCast::BITWISE`] to a value of this type.
#[derive(Clone, Copy, Debug)]
pub struct Bitwise(());

impl Bitwise {
    /// Create the evidence.
    ///
    /// # Safety
    ///
    /// * The `PointerCast` impl using this value must have `cast_to` and `cast_from` equivalent
    ///   to `std::mem::transmute` between types of the same size.
    pub const unsafe fn new_unchecked() -> Self {
        Bitwise(())
    }
}

/// Conversion between the pointer type a C API wants and the pointer type an owner stores.
///
/// This is what allows, for example, a `void **` output parameter to be written into an owner of
/// a `*mut T`.  Any conversion between the two types' "no resource" and resource values works
/// with the default adaptors.  Conversions which reinterpret the bits unchanged should say so
/// with [`PointerCast::BITWISE`], allowing the aliasing adaptors to skip the temporary slot.
///
/// Pointer-to-pointer conversions are provided for all raw pointers.  A custom handle type must
/// implement at least `PointerCast<Self>` to be usable with the adaptors:
///
/// ```
/// # use ffizz_outptr::{Bitwise, PointerCast, RawPointer};
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// #[repr(transparent)]
/// struct Fd(i32);
///
/// // SAFETY: any i32 is a valid Fd, and -1 means "no file"
/// unsafe impl RawPointer for Fd {
///     fn null() -> Self {
///         Fd(-1)
///     }
/// }
///
/// impl PointerCast<Fd> for Fd {
///     // SAFETY: the identity conversion
///     const BITWISE: Option<Bitwise> = Some(unsafe { Bitwise::new_unchecked() });
///
///     fn cast_to(self) -> Fd {
///         self
///     }
///     fn cast_from(other: Fd) -> Self {
///         other
///     }
/// }
/// ```
pub trait PointerCast<To: RawPointer>: RawPointer {
    /// `Some` if the conversion is a reinterpretation of the bits.  The default, `None`, keeps
    /// the adaptors on a separate slot which is converted with `cast_to` at write-back.
    const BITWISE: Option<Bitwise> = None;

    /// Convert this value into the owner's pointer type.
    fn cast_to(self) -> To;

    /// Convert the owner's pointer type into this type.
    fn cast_from(other: To) -> Self;
}

impl<T, U> PointerCast<*mut U> for *mut T {
    // SAFETY: pointer casts between sized types do not change the address
    const BITWISE: Option<Bitwise> = Some(unsafe { Bitwise::new_unchecked() });

    fn cast_to(self) -> *mut U {
        self.cast()
    }

    fn cast_from(other: *mut U) -> Self {
        other.cast()
    }
}

impl<T, U> PointerCast<*const U> for *const T {
    // SAFETY: pointer casts between sized types do not change the address
    const BITWISE: Option<Bitwise> = Some(unsafe { Bitwise::new_unchecked() });

    fn cast_to(self) -> *const U {
        self.cast()
    }

    fn cast_from(other: *const U) -> Self {
        other.cast()
    }
}
