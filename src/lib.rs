//! Direct Memory Access (DMA) driver for the SAM E70/S70/V70/V71 XDMAC.
//!
//! `same70-xdmac` provides
//!
//! - typed channel configuration words and a peripheral request table.
//! - [`BlockTransfer`]s, programmed straight into a channel.
//! - [`LinkedListTransfer`]s, chains of hardware descriptors that a
//!   channel walks on its own, optionally in a loop.
//! - an interrupt dispatcher that calls a handler per channel.
//!
//! This DMA driver may be re-exported from a hardware abstraction layer
//! (HAL). If it is, you should use the APIs provided by your HAL.
//!
//! # Getting started
//!
//! To allocate a [`Dma`] driver, you'll need to know
//!
//! 1. the location of the XDMAC registers.
//! 2. the location of the PMC registers, to turn on the XDMAC clock.
//! 3. the number of DMA channels supported by your chip.
//!
//! The [`same70`] module has all three. Assign a `Dma` to a static, then
//! use that object to create DMA [`Channel`](crate::channel::Channel)s.
//!
//! ```
//! use same70_xdmac::{same70, Dma};
//!
//! // Safety: addresses and channel count are valid for this target.
//! static DMA: Dma<{ same70::CHANNELS }> = unsafe { Dma::new(same70::XDMAC, same70::PMC) };
//!
//! // Safety: we only allocate one DMA channel 7 object.
//! let mut channel = unsafe { DMA.channel(7) };
//! ```
//!
//! Call [`initialize`](Dma::initialize) once before using any channel.
//! If you want interrupts, call [`on_interrupt`](Dma::on_interrupt) from
//! the XDMAC interrupt handler, and unmask the interrupt with
//! [`enable_interrupt_vector`](Dma::enable_interrupt_vector).
//!
//! # Feature flags
//!
//! - `defmt`: `defmt::Format` for public types, and driver logging through
//!   `defmt`. Off by default; without it, the driver doesn't log.
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0)
//! - [MIT License](http://opensource.org/licenses/MIT)
//!
//! at your option.

#![cfg_attr(not(test), no_std)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($($arg:tt)*) => { defmt::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { defmt::warn!($($arg)*) };
        }
    } else {
        macro_rules! trace {
            ($($arg:tt)*) => {{}};
        }
        macro_rules! debug {
            ($($arg:tt)*) => {{}};
        }
        macro_rules! warn {
            ($($arg:tt)*) => {{}};
        }
    }
}

pub mod channel;
mod config;
mod descriptor;
mod error;
mod field;
mod interrupt;
mod ral;
pub mod request;
#[cfg(test)]
mod testing;
mod transfer;

pub use config::{
    AddressingMode, BusInterface, ChannelConfig, DataWidth, DmaRequest, PeripheralDirection,
    RequestSource, TransferType,
};
pub use descriptor::{
    ChainHead, DmaAddress, View, View0Dst, View0Src, View1, View2, View3, ViewType,
    MAX_DATA_LENGTH,
};
pub use error::Error;
pub use field::{Field, FieldValue};
pub use interrupt::{Handler, Interrupts};
pub use transfer::{BlockTransfer, Descriptors, LinkedListTransfer};

/// A DMA result
pub type Result<T> = core::result::Result<T, Error>;

/// Values for SAM E70/S70/V70/V71 parts.
pub mod same70 {
    /// XDMAC register block.
    pub const XDMAC: *const () = 0x4007_8000 as *const ();
    /// Power management controller register block.
    pub const PMC: *const () = 0x400E_0600 as *const ();
    /// Number of XDMAC channels.
    pub const CHANNELS: usize = 24;
    /// XDMAC peripheral identifier, for the peripheral clock.
    pub const XDMAC_PERIPHERAL_ID: u32 = 58;
    /// Implemented NVIC priority bits.
    pub const NVIC_PRIO_BITS: u8 = 3;
}

/// The XDMAC interrupt, shared by all channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XdmacInterrupt;

// Safety: 58 is the XDMAC interrupt number on these parts.
unsafe impl cortex_m::interrupt::InterruptNumber for XdmacInterrupt {
    fn number(self) -> u16 {
        58
    }
}

/// A DMA driver.
///
/// This DMA driver manages the XDMAC and the interrupt handlers of its
/// channels. It's configured with pointers to the XDMAC and the PMC.
///
/// `Dma` allocates [`Channel`](channel::Channel)s. `Channel` provides
/// the interface for scheduling transfers.
pub struct Dma<const CHANNELS: usize> {
    controller: ral::Static<ral::xdmac::RegisterBlock>,
    pmc: ral::Static<ral::pmc::RegisterBlock>,
    handlers: [SharedHandler; CHANNELS],
}

// Safety: OK to allocate a DMA driver in a static context.
unsafe impl<const CHANNELS: usize> Sync for Dma<CHANNELS> {}

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// One bit per channel.
    const ALL_CHANNELS: u32 = ((1u64 << CHANNELS) - 1) as u32;

    /// Create the DMA driver.
    ///
    /// Note that this can evaluate at compile time. Consider using this to
    /// expose a `Dma` through your higher-level API that you can use to
    /// allocate DMA channels.
    ///
    /// `CHANNELS` specifies the total number of channels supported by the DMA
    /// controller. It's referenced when allocating channels.
    ///
    /// # Safety
    ///
    /// Caller must make sure that `controller` is a pointer to the start of the
    /// XDMAC register block, and that `pmc` is a pointer to the start of the
    /// power management controller. Both pointers must be valid for your MCU.
    ///
    /// An incorrect `CHANNELS` value prevents proper bounds checking when
    /// allocating channels.
    ///
    /// # Panics
    ///
    /// Panics if `CHANNELS` exceeds the 24 channels of the register layout.
    pub const unsafe fn new(controller: *const (), pmc: *const ()) -> Self {
        assert!(CHANNELS <= ral::xdmac::CHANNEL_CLUSTERS);
        Self {
            controller: ral::Static(controller.cast()),
            pmc: ral::Static(pmc.cast()),
            handlers: [NO_HANDLER; CHANNELS],
        }
    }

    /// Bring the XDMAC to a known state.
    ///
    /// Turns on the XDMAC clock, disables every channel, and keeps every
    /// channel condition from reaching the interrupt. Pending conditions are
    /// cleared.
    ///
    /// Call this once, before using any channel. Calling it again stops
    /// every channel.
    pub fn initialize(&self) {
        self.pmc.enable_peripheral_clock(same70::XDMAC_PERIPHERAL_ID);
        self.controller.GD.write(Self::ALL_CHANNELS);
        self.controller.GID.write(Self::ALL_CHANNELS);
        for chan in &self.controller.CHANNELS[..CHANNELS] {
            ral::write_reg!(crate::ral::xdmac::channel, chan, CID, Interrupts::all().bits());
            let _ = chan.CIS.read();
        }
        debug!("XDMAC initialized, {=usize} channels", CHANNELS);
    }

    /// Set the XDMAC interrupt priority, and unmask the interrupt.
    ///
    /// `priority` is the logical priority, in `0..8`; lower is more urgent.
    ///
    /// # Safety
    ///
    /// Unmasking may break priority-based critical sections. Call
    /// [`on_interrupt`](Self::on_interrupt) from the interrupt handler
    /// before unmasking.
    pub unsafe fn enable_interrupt_vector(&self, priority: u8) {
        debug_assert!(priority < 1 << same70::NVIC_PRIO_BITS);
        let mut peripherals = cortex_m::Peripherals::steal();
        peripherals
            .NVIC
            .set_priority(XdmacInterrupt, priority << (8 - same70::NVIC_PRIO_BITS));
        cortex_m::peripheral::NVIC::unmask(XdmacInterrupt);
        debug!("XDMAC interrupt unmasked, priority {=u8}", priority);
    }

    /// Mask the XDMAC interrupt.
    pub fn disable_interrupt_vector(&self) {
        cortex_m::peripheral::NVIC::mask(XdmacInterrupt);
        debug!("XDMAC interrupt masked");
    }

    /// Handle the XDMAC interrupt.
    ///
    /// For every channel that raised the interrupt, reads and clears the
    /// channel's conditions, then calls its handler with the enabled
    /// conditions. Channels without a handler only have their conditions
    /// cleared.
    pub fn on_interrupt(&self) {
        let pending = self.controller.GIS.read();
        for (index, handler) in self.handlers.iter().enumerate() {
            if pending & (1 << index) == 0 {
                continue;
            }
            let chan = &self.controller.CHANNELS[index];
            let status = ral::read_reg!(crate::ral::xdmac::channel, chan, CIS);
            let enabled = ral::read_reg!(crate::ral::xdmac::channel, chan, CIM);
            let interrupts = Interrupts::from_bits_truncate(status & enabled);
            if interrupts.is_empty() {
                continue;
            }
            if interrupts.intersects(Interrupts::ERRORS) {
                warn!("XDMAC channel {=usize}: {}", index, interrupts);
            }
            handler.call(interrupts);
        }
    }
}

use interrupt::{SharedHandler, NO_HANDLER};
