//! Channel configuration word
//!
//! [`ChannelConfig`] mirrors the XDMAC `CC` register. It's written to
//! the channel by a [`BlockTransfer`](crate::BlockTransfer), or fetched
//! from memory by the first descriptor of a
//! [`LinkedListTransfer`](crate::LinkedListTransfer).
//!
//! ```
//! use same70_xdmac::{
//!     request, AddressingMode, BusInterface, ChannelConfig, DataWidth,
//!     PeripheralDirection, TransferType,
//! };
//!
//! let config = ChannelConfig::new()
//!     .with(ChannelConfig::TRANSFER_TYPE, TransferType::Peripheral)
//!     .with(ChannelConfig::PERIPHERAL_DIRECTION, PeripheralDirection::MemoryToPeripheral)
//!     .with(ChannelConfig::DATA_WIDTH, DataWidth::HalfWord)
//!     .with(ChannelConfig::SOURCE_BUS_INTERFACE, BusInterface::Bus1)
//!     .with(ChannelConfig::DESTINATION_BUS_INTERFACE, BusInterface::Bus1)
//!     .with(ChannelConfig::SOURCE_ADDRESSING_MODE, AddressingMode::Incrementing)
//!     .with(ChannelConfig::DMA_REQUEST, request::Dacc::TX);
//!
//! assert_eq!(config.get(ChannelConfig::DATA_WIDTH), Some(DataWidth::HalfWord));
//! ```

use crate::field::{Field, FieldValue};

/// Implements `FieldValue` for a fieldless, `u32`-repr enum.
macro_rules! field_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl FieldValue for $name {
            fn into_bits(self) -> u32 {
                self as u32
            }
            fn from_bits(bits: u32) -> Option<Self> {
                $(
                    if bits == $name::$variant as u32 {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }
    };
}

/// Memory-to-memory, or synchronized with a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum TransferType {
    /// Self triggered; runs as soon as the channel is enabled.
    #[default]
    MemoryToMemory = 0,
    /// Paced by the peripheral request selected by [`DmaRequest`].
    Peripheral = 1,
}
field_enum!(TransferType {
    MemoryToMemory,
    Peripheral
});

/// Which end of a peripheral transfer is the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum PeripheralDirection {
    /// Peripheral is the source.
    #[default]
    PeripheralToMemory = 0,
    /// Peripheral is the destination.
    MemoryToPeripheral = 1,
}
field_enum!(PeripheralDirection {
    PeripheralToMemory,
    MemoryToPeripheral
});

/// Where a peripheral transfer's requests come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum RequestSource {
    /// The peripheral request line.
    #[default]
    Hardware = 0,
    /// [`Channel::software_request`](crate::channel::Channel::software_request).
    Software = 1,
}
field_enum!(RequestSource { Hardware, Software });

/// Size of one transferred element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum DataWidth {
    /// 8 bits
    #[default]
    Byte = 0,
    /// 16 bits
    HalfWord = 1,
    /// 32 bits
    Word = 2,
}
field_enum!(DataWidth {
    Byte,
    HalfWord,
    Word
});

impl DataWidth {
    /// Element size in bytes.
    pub const fn bytes(self) -> usize {
        1 << self as u32
    }
}

/// One of the two XDMAC AHB master interfaces.
///
/// On SAME70, peripherals and flash hang off interface 1. SRAM is
/// reachable from both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum BusInterface {
    /// AHB interface 0
    #[default]
    Bus0 = 0,
    /// AHB interface 1
    Bus1 = 1,
}
field_enum!(BusInterface { Bus0, Bus1 });

/// How an address advances after each element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum AddressingMode {
    /// Address stays put. Use this for peripheral data registers.
    #[default]
    Fixed = 0,
    /// Address increments by the data width.
    Incrementing = 1,
    /// Address increments, and jumps by the microblock stride at each
    /// microblock boundary.
    MicroblockStrided = 2,
    /// Address increments by the data stride, and jumps by the
    /// microblock stride at each microblock boundary.
    Strided = 3,
}
field_enum!(AddressingMode {
    Fixed,
    Incrementing,
    MicroblockStrided,
    Strided
});

/// Identifies the peripheral request that paces a channel.
///
/// Seven bits wide. See [`request`](crate::request) for the values
/// assigned to each peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct DmaRequest(u8);

impl DmaRequest {
    /// Largest valid request identifier.
    pub const MAX: u8 = 0x7F;

    /// Create a request identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id` exceeds [`MAX`](Self::MAX). In a `const`
    /// context, that's a compile-time error.
    pub const fn new(id: u8) -> Self {
        assert!(id <= Self::MAX, "DMA request identifiers are seven bits");
        Self(id)
    }

    /// The raw identifier.
    pub const fn id(self) -> u8 {
        self.0
    }
}

impl FieldValue for DmaRequest {
    fn into_bits(self) -> u32 {
        self.0 as u32
    }
    fn from_bits(bits: u32) -> Option<Self> {
        u8::try_from(bits)
            .ok()
            .filter(|id| *id <= Self::MAX)
            .map(Self)
    }
}

/// A channel configuration word.
///
/// Each associated `Field` constant names one hardware field.
/// Fields occupy disjoint bits; setting one never disturbs another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ChannelConfig(u32);

impl ChannelConfig {
    /// Transfer type (`TYPE`).
    pub const TRANSFER_TYPE: Field<TransferType> = Field::new(0b1, 0);
    /// Synchronization direction (`DSYNC`).
    pub const PERIPHERAL_DIRECTION: Field<PeripheralDirection> = Field::new(0b1, 4);
    /// Software request (`SWREQ`).
    pub const REQUEST_SOURCE: Field<RequestSource> = Field::new(0b1, 6);
    /// Data width (`DWIDTH`).
    pub const DATA_WIDTH: Field<DataWidth> = Field::new(0b11, 11);
    /// Source interface (`SIF`).
    pub const SOURCE_BUS_INTERFACE: Field<BusInterface> = Field::new(0b1, 13);
    /// Destination interface (`DIF`).
    pub const DESTINATION_BUS_INTERFACE: Field<BusInterface> = Field::new(0b1, 14);
    /// Source addressing mode (`SAM`).
    pub const SOURCE_ADDRESSING_MODE: Field<AddressingMode> = Field::new(0b11, 16);
    /// Destination addressing mode (`DAM`).
    pub const DESTINATION_ADDRESSING_MODE: Field<AddressingMode> = Field::new(0b11, 18);
    /// Peripheral request (`PERID`).
    pub const DMA_REQUEST: Field<DmaRequest> = Field::new(0x7F, 24);

    /// An all-zero configuration: byte-wide, memory-to-memory, fixed
    /// addresses, interface 0.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wrap a raw `CC` value.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw `CC` value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set `field` to `value`.
    pub fn set<V: FieldValue>(&mut self, field: Field<V>, value: V) {
        field.set(&mut self.0, value);
    }

    /// Read `field`.
    ///
    /// Returns `None` if the raw bits don't name a `V`, like a reserved
    /// data width.
    pub fn get<V: FieldValue>(self, field: Field<V>) -> Option<V> {
        field.get(self.0)
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with<V: FieldValue>(mut self, field: Field<V>, value: V) -> Self {
        self.set(field, value);
        self
    }
}

impl From<ChannelConfig> for u32 {
    fn from(config: ChannelConfig) -> u32 {
        config.bits()
    }
}
