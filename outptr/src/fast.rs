use crate::layout::{alias_offset, storage_ptr};
use crate::owner::{AliasedStorage, Deleter, HasDeleter, Owner, Release, Reset};
use crate::pointer::{PointerCast, RawPointer};
use crate::protocol::OwnershipTraits;

/// The slot used by the aliasing protocols.
///
/// `Aliased` means the C function writes directly into the owner's storage, at the given byte
/// offset.  `Local` is the fallback when the probe finds that aliasing is not possible, and
/// behaves exactly like the default protocols.
pub enum AliasSlot<P, Prior> {
    Local(P),
    Aliased { offset: usize, prior: Prior },
}

/// Output-only protocol writing directly into the owner's pointer storage.
///
/// At construction, the owner's current pointer is released into the slot and the storage is
/// left NULL; the C function then writes straight into the owner.  At write-back, the released
/// pointer is freed with the owner's deleter.  Nothing needs to be copied into the owner.
///
/// This is observably identical to [`crate::DefaultOut`], which it falls back to when
/// [`crate::probe`] rejects the owner/pointer combination, or when the `fast` feature is
/// disabled.  It supports only adaptors without extra reset arguments, since with a new deleter
/// the owner must be rebuilt anyway.
#[non_exhaustive]
pub struct AliasOut;

impl<S, P> OwnershipTraits<S, P, ()> for AliasOut
where
    S: AliasedStorage + HasDeleter + Reset,
    P: PointerCast<S::Pointer>,
{
    type Slot = AliasSlot<P, S::Pointer>;

    fn construct(owner: &mut S, _args: &()) -> Self::Slot {
        match alias_offset::<S, P>(owner) {
            Some(offset) => AliasSlot::Aliased {
                offset,
                prior: owner.release(),
            },
            None => AliasSlot::Local(P::null()),
        }
    }

    fn get(owner: &mut S, slot: &mut Self::Slot) -> *mut P {
        match slot {
            AliasSlot::Local(p) => p as *mut P,
            // SAFETY: offset was validated by the probe
            AliasSlot::Aliased { offset, .. } => unsafe { storage_ptr::<S, P>(owner, *offset) },
        }
    }

    unsafe fn reset(owner: &mut S, slot: Self::Slot, _args: ()) {
        match slot {
            // SAFETY: see docstring
            AliasSlot::Local(p) => unsafe { owner.reset(p.cast_to(), ()) },
            AliasSlot::Aliased { prior, .. } => {
                if !prior.is_null() {
                    // SAFETY:
                    // - prior was released from the owner, so nothing else owns it
                    // - the owner's deleter is the one responsible for its pointers
                    unsafe { owner.deleter().delete(prior) };
                }
            }
        }
    }
}

/// Input/output protocol writing directly into the owner's pointer storage.
///
/// The C function reads and replaces the pointer in place, so there is nothing left to do at
/// write-back.  Falls back to [`crate::DefaultInOut`] behavior when aliasing is not possible.
#[non_exhaustive]
pub struct AliasInOut;

impl<S, P> OwnershipTraits<S, P, ()> for AliasInOut
where
    S: AliasedStorage + Reset,
    P: PointerCast<S::Pointer>,
{
    type Slot = AliasSlot<P, ()>;

    fn construct(owner: &mut S, _args: &()) -> Self::Slot {
        match alias_offset::<S, P>(owner) {
            Some(offset) => AliasSlot::Aliased { offset, prior: () },
            None => AliasSlot::Local(P::cast_from(owner.get())),
        }
    }

    fn get(owner: &mut S, slot: &mut Self::Slot) -> *mut P {
        match slot {
            AliasSlot::Local(p) => p as *mut P,
            // SAFETY: offset was validated by the probe
            AliasSlot::Aliased { offset, .. } => unsafe { storage_ptr::<S, P>(owner, *offset) },
        }
    }

    unsafe fn reset(owner: &mut S, slot: Self::Slot, _args: ()) {
        if let AliasSlot::Local(p) = slot {
            owner.release();
            // SAFETY: see docstring
            unsafe { owner.reset(p.cast_to(), ()) };
        }
    }
}
