use crate::owner::Owner;
use crate::pointer::RawPointer;
use crate::protocol::OwnershipTraits;
use crate::resolve::OutAdaptor;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

/// OutPtr is an in-flight transfer of a handle from a C output parameter into an owner.
///
/// It borrows the owner mutably for its whole lifetime, so at most one adaptor can exist per owner
/// at a time.  While it exists, [`OutAdaptor::as_mut_ptr`] gives the address the C function should
/// write to; only the most recently returned address may be used.  When it is dropped --
/// normally at the end of the statement containing the C call, but also when unwinding from a
/// panic -- the slot is committed into the owner, exactly once, as described by the protocol `T`.
///
/// The adaptor is not `Clone`.  Moving it moves the responsibility for the write-back along with
/// it.
///
/// Most code should not name this type, but use [`crate::out_ptr`] and friends, which select the
/// protocol appropriate to the owner.
///
/// # Failure of the C function
///
/// The adaptor cannot tell whether the C function succeeded.  Whatever the slot contains at
/// write-back is committed.  C APIs that leave the output parameter untouched on failure will
/// leave the owner empty (output-only adaptation) or unchanged (input/output adaptation); APIs
/// that write garbage on failure must not be used with an adaptor.
pub struct OutPtr<'a, S, P, A, T>
where
    S: Owner,
    P: RawPointer,
    T: OwnershipTraits<S, P, A>,
{
    owner: &'a mut S,
    // taken exactly once, in Drop
    pending: ManuallyDrop<(T::Slot, A)>,
    _phantom: PhantomData<fn() -> P>,
}

impl<'a, S, P, A, T> OutAdaptor<'a, S, P, A> for OutPtr<'a, S, P, A, T>
where
    S: Owner + 'a,
    P: RawPointer,
    T: OwnershipTraits<S, P, A>,
{
    fn new(owner: &'a mut S, args: A) -> Self {
        let slot = T::construct(owner, &args);
        OutPtr {
            owner,
            pending: ManuallyDrop::new((slot, args)),
            _phantom: PhantomData,
        }
    }

    fn as_mut_ptr(&mut self) -> *mut P {
        T::get(self.owner, &mut self.pending.0)
    }
}

impl<'a, S, P, A, T> Drop for OutPtr<'a, S, P, A, T>
where
    S: Owner,
    P: RawPointer,
    T: OwnershipTraits<S, P, A>,
{
    fn drop(&mut self) {
        // SAFETY: pending is not used again after this point
        let (slot, args) = unsafe { ManuallyDrop::take(&mut self.pending) };
        // SAFETY:
        // - the slot holds what construct put there, or what C wrote through as_mut_ptr; the
        //   caller of the (unsafe) C function is responsible for the latter being valid
        unsafe { T::reset(self.owner, slot, args) };
    }
}
