//! DMA channels
//!
//! A [`Channel`] is a handle to one XDMAC channel. It owns nothing but an
//! index; the channel's state lives in hardware. Arm a channel with a
//! [`BlockTransfer`] or a [`LinkedListTransfer`], then start it.
//!
//! ```no_run
//! use same70_xdmac::{same70, BlockTransfer, Dma, Interrupts};
//!
//! static DMA: Dma<{ same70::CHANNELS }> = unsafe { Dma::new(same70::XDMAC, same70::PMC) };
//!
//! fn on_done(interrupts: Interrupts) {
//!     // Re-arm, or signal a task.
//! }
//!
//! DMA.initialize();
//! // Safety: only one handle for channel 0.
//! let mut channel = unsafe { DMA.channel(0) };
//!
//! let transfer = BlockTransfer::new();
//! // ...
//! channel.set_transfer(&transfer);
//! channel.set_interrupt_handler(on_done);
//! channel.enable_interrupt_flag(Interrupts::END_OF_BLOCK);
//! channel.enable_interrupts();
//! // Safety: the transfer's buffers are static.
//! unsafe { channel.start_transfer() };
//! ```

use core::mem::ManuallyDrop;
use core::sync::atomic::{self, Ordering};

use crate::descriptor::ViewType;
use crate::interrupt::{Handler, Interrupts, SharedHandler};
use crate::ral::{self, xdmac, Static};
use crate::transfer::{BlockTransfer, Descriptors, LinkedListTransfer};

impl<const CHANNELS: usize> crate::Dma<CHANNELS> {
    /// Creates the DMA channel described by `index`.
    ///
    /// # Safety
    ///
    /// This will create a handle that may alias global, mutable state. You should only create
    /// one channel per index. If there are multiple channels for the same index, you're
    /// responsible for ensuring synchronized access.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than or equal to the maximum number of channels.
    pub unsafe fn channel(&'static self, index: usize) -> Channel {
        assert!(index < CHANNELS);
        Channel {
            index,
            registers: self.controller,
            handler: &self.handlers[index],
        }
    }
}

/// A DMA channel
///
/// You should rely on your HAL to allocate `Channel`s. If your HAL does not allocate channels,
/// or if you're designing the HAL, use [`Dma`](crate::Dma) to create channels.
///
/// A `Channel` armed with a [`BlockTransfer`] stores addresses independent of the memory
/// lifetime. You must make sure that the memory is valid before starting the transfer.
pub struct Channel {
    /// Our channel number, in `[0, CHANNELS)`
    index: usize,
    /// Reference to the XDMAC registers
    registers: Static<xdmac::RegisterBlock>,
    /// This channel's interrupt handler.
    handler: &'static SharedHandler,
}

impl Channel {
    /// Returns the DMA channel number
    pub fn channel(&self) -> usize {
        self.index
    }

    fn bit(&self) -> u32 {
        1 << self.index
    }

    fn registers(&self) -> &xdmac::channel::RegisterBlock {
        &self.registers.CHANNELS[self.index]
    }

    /// Arm the channel with a single block transfer.
    ///
    /// Programs the channel registers from `transfer` and turns off
    /// descriptor fetching. Any previously armed, but not started, transfer
    /// is replaced. Stale interrupt conditions are dropped.
    ///
    /// The channel must not be running. Debug builds check this.
    pub fn set_transfer(&mut self, transfer: &BlockTransfer) {
        debug_assert!(!self.is_enabled(), "DMA channel {} is running", self.index);
        let chan = self.registers();
        ral::write_reg!(crate::ral::xdmac::channel, chan, CNDC, 0);
        ral::write_reg!(crate::ral::xdmac::channel, chan, CSA, transfer.source_address());
        ral::write_reg!(crate::ral::xdmac::channel, chan, CDA, transfer.destination_address());
        ral::write_reg!(
            crate::ral::xdmac::channel,
            chan,
            CUBC,
            UBLEN: transfer.data_length() as u32
        );
        ral::write_reg!(crate::ral::xdmac::channel, chan, CBC, 0);
        ral::write_reg!(crate::ral::xdmac::channel, chan, CC, transfer.configuration().bits());
        ral::write_reg!(crate::ral::xdmac::channel, chan, CDS_MSP, transfer.data_stride_bits());
        ral::write_reg!(crate::ral::xdmac::channel, chan, CSUS, 0);
        ral::write_reg!(crate::ral::xdmac::channel, chan, CDUS, 0);
        let _ = chan.CIS.read();
    }

    /// Arm the channel with a chain of descriptors.
    ///
    /// Links the chain where it sits, and points the channel at the first
    /// descriptor. The channel loads everything else from memory once
    /// started.
    ///
    /// The returned guard borrows both the channel and the transfer, so the
    /// chain can't move or drop while the hardware might read it. Dropping
    /// the guard stops the channel.
    ///
    /// The channel must not be running. Debug builds check this.
    pub fn set_linked_list_transfer<'a, D: Descriptors>(
        &'a mut self,
        transfer: &'a mut LinkedListTransfer<D>,
    ) -> Armed<'a, D> {
        debug_assert!(!self.is_enabled(), "DMA channel {} is running", self.index);
        transfer.link();

        let chan = self.registers();
        ral::write_reg!(
            crate::ral::xdmac::channel,
            chan,
            CNDA,
            NDAIF: 0,
            NDA: transfer.address() >> 2
        );
        ral::write_reg!(
            crate::ral::xdmac::channel,
            chan,
            CNDC,
            NDE: 1,
            NDSUP: 1,
            NDDUP: 1,
            NDVIEW: D::HEAD as u32
        );
        // A view 2 head doesn't load these.
        if D::HEAD != ViewType::View3 {
            ral::write_reg!(crate::ral::xdmac::channel, chan, CBC, 0);
            ral::write_reg!(crate::ral::xdmac::channel, chan, CDS_MSP, 0);
            ral::write_reg!(crate::ral::xdmac::channel, chan, CSUS, 0);
            ral::write_reg!(crate::ral::xdmac::channel, chan, CDUS, 0);
        }
        let _ = chan.CIS.read();

        Armed {
            channel: self,
            transfer,
        }
    }

    /// Start the armed transfer.
    ///
    /// # Safety
    ///
    /// Every address the transfer uses must be valid for the transfer's
    /// duration. That covers the block transfer's source and destination,
    /// and every buffer that a descriptor chain points at.
    pub unsafe fn start_transfer(&self) {
        // Descriptor and buffer writes land before the channel reads them.
        atomic::fence(Ordering::SeqCst);
        self.registers.GE.write(self.bit());
        trace!("XDMAC channel {=usize} started", self.index);
    }

    /// Stop the channel.
    ///
    /// The channel finishes its current bus access, then disables. Data
    /// that was in flight is lost. Check [`is_enabled`](Self::is_enabled) to
    /// see when it's done, or wait for
    /// [`END_OF_DISABLE`](Interrupts::END_OF_DISABLE).
    pub fn stop_transfer(&self) {
        // Immutable write OK. GD only affects this channel's bit.
        self.registers.GD.write(self.bit());
        trace!("XDMAC channel {=usize} stopped", self.index);
    }

    /// Returns `true` if the channel is running.
    pub fn is_enabled(&self) -> bool {
        self.registers.GS.read() & self.bit() != 0
    }

    /// Request one transfer from software.
    ///
    /// Applies to channels that use
    /// [`RequestSource::Software`](crate::RequestSource::Software).
    pub fn software_request(&self) {
        self.registers.GSWR.write(self.bit());
    }

    /// Returns `true` while a software request is pending.
    pub fn is_software_request_pending(&self) -> bool {
        self.registers.GSWS.read() & self.bit() != 0
    }

    /// Flush the channel FIFO to the destination.
    ///
    /// Completion raises [`END_OF_FLUSH`](Interrupts::END_OF_FLUSH).
    pub fn flush(&self) {
        self.registers.GSWF.write(self.bit());
    }

    /// Let the channel's conditions reach the XDMAC interrupt.
    pub fn enable_interrupts(&self) {
        self.registers.GIE.write(self.bit());
    }

    /// Keep the channel's conditions from reaching the XDMAC interrupt.
    ///
    /// Conditions are still recorded in the status register.
    pub fn disable_interrupts(&self) {
        self.registers.GID.write(self.bit());
    }

    /// Returns `true` if the channel's conditions reach the XDMAC interrupt.
    pub fn is_interrupt_enabled(&self) -> bool {
        self.registers.GIM.read() & self.bit() != 0
    }

    /// Enable one or more interrupt conditions.
    pub fn enable_interrupt_flag(&self, interrupts: Interrupts) {
        let chan = self.registers();
        ral::write_reg!(crate::ral::xdmac::channel, chan, CIE, interrupts.bits());
    }

    /// Disable one or more interrupt conditions.
    pub fn disable_interrupt_flag(&self, interrupts: Interrupts) {
        let chan = self.registers();
        ral::write_reg!(crate::ral::xdmac::channel, chan, CID, interrupts.bits());
    }

    /// The enabled interrupt conditions.
    pub fn interrupt_mask(&self) -> Interrupts {
        let chan = self.registers();
        Interrupts::from_bits_truncate(ral::read_reg!(crate::ral::xdmac::channel, chan, CIM))
    }

    /// Read the pending conditions. This clears them.
    ///
    /// Reports every condition, enabled or not. There's no other way to
    /// clear a condition, so read once and keep the result.
    pub fn read_and_clear_flags(&self) -> Interrupts {
        let chan = self.registers();
        Interrupts::from_bits_truncate(ral::read_reg!(crate::ral::xdmac::channel, chan, CIS))
    }

    /// Install the handler that [`Dma::on_interrupt`](crate::Dma::on_interrupt)
    /// calls for this channel.
    ///
    /// Replaces any previous handler.
    pub fn set_interrupt_handler(&self, handler: Handler) {
        self.handler.install(handler);
    }

    /// Remove this channel's handler.
    pub fn clear_interrupt_handler(&self) {
        self.handler.clear();
    }
}

/// A channel armed with a linked list transfer.
///
/// Returned by [`Channel::set_linked_list_transfer`]. The guard holds on
/// to the channel and the chain. Dropping it stops the channel and waits
/// until the channel is disabled.
///
/// The chain can't be moved or dropped while armed:
///
/// ```compile_fail
/// use same70_xdmac::{channel::Channel, LinkedListTransfer, View2};
///
/// fn arm(channel: &mut Channel) {
///     let mut transfer = LinkedListTransfer::<(View2,)>::new();
///     let armed = channel.set_linked_list_transfer(&mut transfer);
///     drop(transfer);
///     drop(armed);
/// }
/// ```
pub struct Armed<'a, D: Descriptors> {
    channel: &'a mut Channel,
    transfer: &'a mut LinkedListTransfer<D>,
}

impl<'a, D: Descriptors> Armed<'a, D> {
    /// Start walking the chain.
    ///
    /// # Safety
    ///
    /// Every buffer the descriptors point at must be valid for as long as
    /// the channel runs. For a circular chain that's until it's stopped.
    ///
    /// The guard must not be leaked while the channel runs. Leaking it, with
    /// `core::mem::forget` or a reference cycle, ends the borrow of the
    /// chain without stopping the channel, and the controller would keep
    /// reading descriptors that may be freed. Use [`detach`](Armed::detach)
    /// to leave a `'static` chain running.
    ///
    /// ```no_run
    /// use same70_xdmac::{channel::Channel, LinkedListTransfer, View3};
    ///
    /// fn run(channel: &mut Channel) {
    ///     let mut transfer = LinkedListTransfer::<(View3,)>::new();
    ///     transfer.set_circular_mode(true);
    ///     let mut armed = channel.set_linked_list_transfer(&mut transfer);
    ///     // Safety: no buffers; the guard drops before the chain.
    ///     unsafe { armed.start() };
    ///     // Stops the channel. Never `core::mem::forget(armed)` here.
    ///     drop(armed);
    /// }
    /// ```
    pub unsafe fn start(&mut self) {
        self.channel.start_transfer();
    }

    /// Stop the channel, and wait until it's disabled.
    ///
    /// The chain stays armed. It restarts from whatever descriptor the
    /// channel stopped on.
    pub fn stop(&mut self) {
        self.channel.stop_transfer();
        while self.channel.is_enabled() {
            core::hint::spin_loop();
        }
    }

    /// Returns `true` if the channel is running.
    pub fn is_enabled(&self) -> bool {
        self.channel.is_enabled()
    }

    /// The armed channel.
    pub fn channel(&self) -> &Channel {
        &*self.channel
    }

    /// Views into the armed chain.
    ///
    /// The channel may be reading these descriptors right now. Only touch
    /// descriptors that it isn't using; swapping the buffer of the
    /// descriptor that just completed is the usual pattern.
    pub fn descriptors(&mut self) -> D::Views<'_> {
        self.transfer.descriptors()
    }

    /// Stop the channel and give back the chain.
    pub fn disarm(self) -> &'a mut LinkedListTransfer<D> {
        let mut this = ManuallyDrop::new(self);
        this.stop();
        // Safety: `this` is never dropped, so the borrow moves out exactly once.
        unsafe { core::ptr::read(&this.transfer) }
    }
}

impl<D: Descriptors> Armed<'static, D> {
    /// Leave the channel running, and forget the guard.
    ///
    /// Only for chains that live forever:
    ///
    /// ```compile_fail
    /// use same70_xdmac::{channel::Channel, LinkedListTransfer, View2};
    ///
    /// fn run(channel: &'static mut Channel) {
    ///     let mut transfer = LinkedListTransfer::<(View2,)>::new();
    ///     channel.set_linked_list_transfer(&mut transfer).detach();
    /// }
    /// ```
    pub fn detach(self) {
        core::mem::forget(self);
    }
}

impl<D: Descriptors> Drop for Armed<'_, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{fake, peek, poke, Fake};
    use crate::{
        request, AddressingMode, BlockTransfer, ChannelConfig, DataWidth, Interrupts,
        LinkedListTransfer, PeripheralDirection, TransferType, View0Src, View2, View3,
    };
    use core::sync::atomic::{AtomicU32, Ordering};

    const DACC_CDR0: u32 = 0x4003_C01C;

    fn dac_config() -> ChannelConfig {
        ChannelConfig::new()
            .with(ChannelConfig::TRANSFER_TYPE, TransferType::Peripheral)
            .with(
                ChannelConfig::PERIPHERAL_DIRECTION,
                PeripheralDirection::MemoryToPeripheral,
            )
            .with(ChannelConfig::DATA_WIDTH, DataWidth::HalfWord)
            .with(ChannelConfig::SOURCE_ADDRESSING_MODE, AddressingMode::Incrementing)
            .with(ChannelConfig::DESTINATION_ADDRESSING_MODE, AddressingMode::Fixed)
            .with(ChannelConfig::DMA_REQUEST, request::Dacc::TX)
    }

    #[test]
    fn block_transfer_to_the_dac() {
        static SAMPLES: [u16; 50] = [0; 50];
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(0) };

        let mut transfer = BlockTransfer::new();
        transfer.set_source_address(&SAMPLES);
        transfer.set_destination_address(DACC_CDR0);
        transfer.set_data_length(SAMPLES.len());
        transfer.set_configuration(dac_config());
        channel.set_transfer(&transfer);
        unsafe { channel.start_transfer() };

        let chan = &xdmac.CHANNELS[0];
        assert_eq!(peek(&chan.CUBC), 50);
        assert_eq!(peek(&chan.CSA), SAMPLES.as_ptr() as usize as u32);
        assert_eq!(peek(&chan.CDA), DACC_CDR0);
        assert_eq!(peek(&chan.CNDC), 0);

        let config = ChannelConfig::from_bits(peek(&chan.CC));
        assert_eq!(
            config.get(ChannelConfig::PERIPHERAL_DIRECTION),
            Some(PeripheralDirection::MemoryToPeripheral)
        );
        assert_eq!(config.get(ChannelConfig::DATA_WIDTH), Some(DataWidth::HalfWord));
        assert_eq!(
            config.get(ChannelConfig::SOURCE_ADDRESSING_MODE),
            Some(AddressingMode::Incrementing)
        );
        assert_eq!(config.get(ChannelConfig::DMA_REQUEST), Some(request::Dacc::TX));
        assert_eq!(peek(&xdmac.GE), 1 << 0);
    }

    #[test]
    fn rearm_start_stop() {
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(5) };
        let chan = &xdmac.CHANNELS[5];

        let mut first = BlockTransfer::new();
        first.set_source_address(0x2040_0000u32);
        first.set_destination_address(0x2040_1000u32);
        first.set_data_length(16);
        first.set_source_data_stride(-2);
        channel.set_transfer(&first);
        assert_eq!(peek(&chan.CDS_MSP), 0x0000_FFFE);

        // Armed, not started: replace it.
        let mut second = first;
        second.set_data_length(32);
        second.set_source_data_stride(0);
        second.set_configuration(dac_config());
        channel.set_transfer(&second);

        assert!(!channel.is_enabled());
        unsafe { channel.start_transfer() };
        assert_eq!(peek(&xdmac.GE), 1 << 5);
        poke(&xdmac.GS, 1 << 5);
        assert!(channel.is_enabled());
        assert_eq!(peek(&chan.CUBC), 32);
        assert_eq!(peek(&chan.CDS_MSP), 0);
        assert_eq!(peek(&chan.CC), dac_config().bits());

        channel.stop_transfer();
        assert_eq!(peek(&xdmac.GD), 1 << 5);
        poke(&xdmac.GS, 0);
        assert!(!channel.is_enabled());
    }

    #[test]
    fn linked_list_registers() {
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(2) };
        let chan = &xdmac.CHANNELS[2];
        poke(&chan.CDS_MSP, 0xFFFF_FFFF);
        poke(&chan.CBC, 7);

        let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
        {
            let (first, second) = transfer.descriptors();
            first.set_configuration(dac_config());
            first.set_data_length(50);
            second.set_data_length(50);
        }
        transfer.set_circular_mode(true);

        let head = transfer.address();
        let mut armed = channel.set_linked_list_transfer(&mut transfer);
        assert_eq!(peek(&chan.CNDA), head);
        // NDE, NDSUP, NDDUP, view 2
        assert_eq!(peek(&chan.CNDC), 0b1_0111);
        assert_eq!(peek(&chan.CDS_MSP), 0);
        assert_eq!(peek(&chan.CBC), 0);

        unsafe { armed.start() };
        assert_eq!(peek(&xdmac.GE), 1 << 2);

        let (_, second) = armed.descriptors();
        second.set_source_address(0x2040_2000u32);

        let transfer = armed.disarm();
        assert_eq!(peek(&xdmac.GD), 1 << 2);
        let (_, second) = transfer.descriptors();
        assert_eq!(second.source_address(), 0x2040_2000);
        assert_eq!(second.next_descriptor(), head);
    }

    #[test]
    fn view3_head_keeps_stride_registers() {
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(1) };
        let chan = &xdmac.CHANNELS[1];
        poke(&chan.CDS_MSP, 0x1234_5678);

        let mut transfer = LinkedListTransfer::<(View3,)>::new();
        let armed = channel.set_linked_list_transfer(&mut transfer);
        assert_eq!(peek(&chan.CNDC), 0b1_1111);
        assert_eq!(peek(&chan.CDS_MSP), 0x1234_5678);

        drop(armed);
        assert_eq!(peek(&xdmac.GD), 1 << 1);
    }

    #[test]
    fn interrupt_controls() {
        let Fake { dma, xdmac, .. } = fake();
        let channel = unsafe { dma.channel(7) };
        let chan = &xdmac.CHANNELS[7];

        channel.enable_interrupt_flag(Interrupts::END_OF_BLOCK | Interrupts::READ_BUS_ERROR);
        assert_eq!(peek(&chan.CIE), 0b1_0001);
        channel.disable_interrupt_flag(Interrupts::END_OF_FLUSH);
        assert_eq!(peek(&chan.CID), 0b1000);

        poke(&chan.CIM, 0b1_0001);
        assert_eq!(
            channel.interrupt_mask(),
            Interrupts::END_OF_BLOCK | Interrupts::READ_BUS_ERROR
        );

        channel.enable_interrupts();
        assert_eq!(peek(&xdmac.GIE), 1 << 7);
        channel.disable_interrupts();
        assert_eq!(peek(&xdmac.GID), 1 << 7);
        poke(&xdmac.GIM, 1 << 7);
        assert!(channel.is_interrupt_enabled());

        channel.software_request();
        assert_eq!(peek(&xdmac.GSWR), 1 << 7);
        channel.flush();
        assert_eq!(peek(&xdmac.GSWF), 1 << 7);
    }

    /// A RAM register can't clear itself when read, so this only covers the
    /// first read after a condition. Clearing on read is up to the hardware.
    #[test]
    fn flags_come_from_status() {
        let Fake { dma, xdmac, .. } = fake();
        let channel = unsafe { dma.channel(3) };
        let chan = &xdmac.CHANNELS[3];

        assert!(channel.read_and_clear_flags().is_empty());
        // Hardware sets a condition; undefined bits are ignored.
        poke(&chan.CIS, 0x8000_0002);
        assert_eq!(channel.read_and_clear_flags(), Interrupts::END_OF_LINKED_LIST);
    }

    #[test]
    fn dropping_a_started_guard_stops_the_channel() {
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(6) };
        let mut transfer = LinkedListTransfer::<(View3,)>::new();
        transfer.set_circular_mode(true);
        {
            let mut armed = channel.set_linked_list_transfer(&mut transfer);
            unsafe { armed.start() };
            assert_eq!(peek(&xdmac.GE), 1 << 6);
            assert_eq!(peek(&xdmac.GD), 0);
        }
        assert_eq!(peek(&xdmac.GD), 1 << 6);
        drop(transfer);
    }

    #[test]
    fn clearing_status_between_reads() {
        let Fake { dma, xdmac, .. } = fake();
        let channel = unsafe { dma.channel(3) };
        let chan = &xdmac.CHANNELS[3];

        poke(&chan.CIS, Interrupts::END_OF_BLOCK.bits());
        assert_eq!(channel.read_and_clear_flags(), Interrupts::END_OF_BLOCK);
        // What the hardware does after that read.
        poke(&chan.CIS, 0);
        assert!(channel.read_and_clear_flags().is_empty());
    }

    #[test]
    fn handler_is_per_channel() {
        static SEEN: AtomicU32 = AtomicU32::new(0);
        fn record(interrupts: Interrupts) {
            SEEN.fetch_or(interrupts.bits(), Ordering::SeqCst);
        }

        let Fake { dma, .. } = fake();
        let first = unsafe { dma.channel(0) };
        first.set_interrupt_handler(record);
        assert!(dma.handlers[0].get().is_some());
        assert!(dma.handlers[1].get().is_none());

        first.clear_interrupt_handler();
        assert!(dma.handlers[0].get().is_none());
    }

    #[test]
    #[should_panic]
    fn out_of_range_channel() {
        let Fake { dma, .. } = fake();
        let _ = unsafe { dma.channel(24) };
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn rearming_a_running_channel() {
        let Fake { dma, xdmac, .. } = fake();
        let mut channel = unsafe { dma.channel(4) };
        poke(&xdmac.GS, 1 << 4);
        channel.set_transfer(&BlockTransfer::new());
    }
}
