//! Channel interrupt conditions, and the handler slot behind each channel.

use core::sync::atomic::{AtomicPtr, Ordering};

use crate::{Error, Result};

bitflags::bitflags! {
    /// Channel interrupt conditions.
    ///
    /// The same bits select conditions in the channel's interrupt mask and
    /// report them in its status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interrupts: u32 {
        /// The current block finished.
        const END_OF_BLOCK = 1 << 0;
        /// The last descriptor of a linked list finished.
        const END_OF_LINKED_LIST = 1 << 1;
        /// The channel finished disabling.
        const END_OF_DISABLE = 1 << 2;
        /// A software flush completed.
        const END_OF_FLUSH = 1 << 3;
        /// A bus error while reading the source.
        const READ_BUS_ERROR = 1 << 4;
        /// A bus error while writing the destination.
        const WRITE_BUS_ERROR = 1 << 5;
        /// A peripheral request arrived before the last one was served.
        const REQUEST_OVERFLOW = 1 << 6;

        /// Every error condition.
        const ERRORS = Self::READ_BUS_ERROR.bits()
            | Self::WRITE_BUS_ERROR.bits()
            | Self::REQUEST_OVERFLOW.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Interrupts {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Interrupts({=u32:#x})", self.bits())
    }
}

impl Interrupts {
    /// The most severe error condition in this set, if any.
    ///
    /// Read bus errors come first, then write bus errors, then request
    /// overflows.
    pub const fn error(self) -> Option<Error> {
        if self.contains(Self::READ_BUS_ERROR) {
            Some(Error::ReadBus)
        } else if self.contains(Self::WRITE_BUS_ERROR) {
            Some(Error::WriteBus)
        } else if self.contains(Self::REQUEST_OVERFLOW) {
            Some(Error::RequestOverflow)
        } else {
            None
        }
    }

    /// `Ok` with every condition, unless the set carries an error.
    ///
    /// ```
    /// use same70_xdmac::{Error, Interrupts};
    ///
    /// let done = Interrupts::END_OF_BLOCK | Interrupts::END_OF_LINKED_LIST;
    /// assert_eq!(done.into_result(), Ok(done));
    ///
    /// let failed = Interrupts::END_OF_BLOCK | Interrupts::WRITE_BUS_ERROR;
    /// assert_eq!(failed.into_result(), Err(Error::WriteBus));
    /// ```
    pub const fn into_result(self) -> Result<Self> {
        match self.error() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// A channel interrupt handler.
///
/// Runs in the XDMAC interrupt, with the conditions that were pending and
/// enabled for the channel. Those flags are already cleared in hardware.
pub type Handler = fn(Interrupts);

/// Holds one optional [`Handler`].
///
/// The interrupt either sees a complete handler or none at all.
pub(crate) struct SharedHandler(AtomicPtr<()>);

#[allow(clippy::declare_interior_mutable_const)] // Only used to initialize arrays.
pub(crate) const NO_HANDLER: SharedHandler = SharedHandler(AtomicPtr::new(core::ptr::null_mut()));

impl SharedHandler {
    pub(crate) fn install(&self, handler: Handler) {
        self.0.store(handler as *mut (), Ordering::Release);
    }

    pub(crate) fn clear(&self) {
        self.0.store(core::ptr::null_mut(), Ordering::Release);
    }

    pub(crate) fn get(&self) -> Option<Handler> {
        let ptr = self.0.load(Ordering::Acquire);
        if ptr.is_null() {
            None
        } else {
            // Safety: the only non-null values we store are Handlers.
            Some(unsafe { core::mem::transmute::<*mut (), Handler>(ptr) })
        }
    }

    /// Call the handler, if there is one. Returns `true` if called.
    pub(crate) fn call(&self, interrupts: Interrupts) -> bool {
        match self.get() {
            Some(handler) => {
                handler(interrupts);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32;

    #[test]
    fn hardware_bit_positions() {
        assert_eq!(Interrupts::all().bits(), 0x7F);
        assert_eq!(Interrupts::ERRORS.bits(), 0x70);
        assert_eq!(Interrupts::END_OF_FLUSH.bits(), 1 << 3);
        assert_eq!(
            Interrupts::from_bits_truncate(0xFFFF_FF81),
            Interrupts::END_OF_BLOCK
        );
    }

    #[test]
    fn error_priority() {
        assert_eq!(Interrupts::empty().error(), None);
        assert_eq!(Interrupts::END_OF_BLOCK.error(), None);
        assert_eq!(Interrupts::ERRORS.error(), Some(Error::ReadBus));
        assert_eq!(
            (Interrupts::WRITE_BUS_ERROR | Interrupts::REQUEST_OVERFLOW).error(),
            Some(Error::WriteBus)
        );
        assert_eq!(
            Interrupts::REQUEST_OVERFLOW.into_result(),
            Err(Error::RequestOverflow)
        );
    }

    #[test]
    fn handler_slot() {
        static SEEN: AtomicU32 = AtomicU32::new(0);
        fn record(interrupts: Interrupts) {
            SEEN.store(interrupts.bits(), Ordering::SeqCst);
        }

        let slot = NO_HANDLER;
        assert!(slot.get().is_none());
        assert!(!slot.call(Interrupts::END_OF_BLOCK));

        slot.install(record);
        assert!(slot.call(Interrupts::END_OF_LINKED_LIST));
        assert_eq!(SEEN.load(Ordering::SeqCst), 1 << 1);

        slot.clear();
        assert!(!slot.call(Interrupts::END_OF_BLOCK));
        assert_eq!(SEEN.load(Ordering::SeqCst), 1 << 1);
    }
}
