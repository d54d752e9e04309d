use crate::owner::{Owner, Release, Reset};
use crate::pointer::{PointerCast, RawPointer};

/// The protocol an adaptor follows to move a handle from a C output parameter into an owner.
///
/// An implementation describes, for owner `S`, requested pointer type `P`, and extra reset
/// arguments `A` (`()` or `(D,)`):
///
/// * how to create the slot the C function will write to ([`OwnershipTraits::construct`]),
/// * how to find the address of that slot ([`OwnershipTraits::get`]), and
/// * how to commit the slot's final value into the owner ([`OwnershipTraits::reset`]).
///
/// Implementations are zero-sized marker types, never instantiated.  [`DefaultOut`] and
/// [`DefaultInOut`] cover any owner implementing the relevant capabilities; owners with special
/// needs can supply their own implementation and name it in their [`crate::ResolveOut`] or
/// [`crate::ResolveInOut`] impl.
pub trait OwnershipTraits<S: Owner, P: RawPointer, A> {
    /// Working storage for one adaptation.
    type Slot;

    /// Create the slot, before the C function is called.
    fn construct(owner: &mut S, args: &A) -> Self::Slot;

    /// Get the address handed to the C function.  This may be called several times, and the
    /// result must be the same each time.
    fn get(owner: &mut S, slot: &mut Self::Slot) -> *mut P;

    /// Commit the slot into the owner.  This is called exactly once per adaptation.
    ///
    /// # Safety
    ///
    /// * The slot must contain either the value written by `construct`, or a value written by C
    ///   satisfying the requirements of [`Reset::reset`] for the owner.
    unsafe fn reset(owner: &mut S, slot: Self::Slot, args: A);
}

/// Default protocol for output-only adaptation.
///
/// The slot is a separate `P`, initially NULL.  At write-back, the owner is reset to the slot's
/// value, which frees whatever the owner held before.
#[non_exhaustive]
pub struct DefaultOut;

impl<S, P, A> OwnershipTraits<S, P, A> for DefaultOut
where
    S: Reset<A>,
    P: PointerCast<S::Pointer>,
{
    type Slot = P;

    fn construct(_owner: &mut S, _args: &A) -> P {
        P::null()
    }

    fn get(_owner: &mut S, slot: &mut P) -> *mut P {
        slot as *mut P
    }

    unsafe fn reset(owner: &mut S, slot: P, args: A) {
        // SAFETY: see docstring
        unsafe { owner.reset(slot.cast_to(), args) };
    }
}

/// Default protocol for input/output adaptation.
///
/// The slot is a separate `P`, initially holding the owner's current pointer.  At write-back, the
/// owner releases its pointer (the C function has taken it over) and is reset to the slot's
/// value.
///
/// Only owners implementing [`Release`] can use this protocol.
#[non_exhaustive]
pub struct DefaultInOut;

impl<S, P, A> OwnershipTraits<S, P, A> for DefaultInOut
where
    S: Release + Reset<A>,
    P: PointerCast<S::Pointer>,
{
    type Slot = P;

    fn construct(owner: &mut S, _args: &A) -> P {
        P::cast_from(owner.get())
    }

    fn get(_owner: &mut S, slot: &mut P) -> *mut P {
        slot as *mut P
    }

    unsafe fn reset(owner: &mut S, slot: P, args: A) {
        owner.release();
        // SAFETY: see docstring
        unsafe { owner.reset(slot.cast_to(), args) };
    }
}
