//! DMA error conditions

use core::fmt;

/// A hardware transfer error.
///
/// The XDMAC reports these as channel interrupt conditions. See
/// [`Interrupts::error`](crate::Interrupts::error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bus error while reading the source, or fetching a descriptor.
    ReadBus,
    /// Bus error while writing the destination.
    WriteBus,
    /// A peripheral request overflowed.
    ///
    /// The peripheral asked for another transfer before the channel
    /// served the previous request. Data was likely lost.
    RequestOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ReadBus => f.write_str("DMA read bus error"),
            Error::WriteBus => f.write_str("DMA write bus error"),
            Error::RequestOverflow => f.write_str("DMA request overflow"),
        }
    }
}
