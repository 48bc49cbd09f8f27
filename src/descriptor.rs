//! Linked list descriptor views
//!
//! The XDMAC walks linked lists of *descriptors* in memory. A descriptor
//! comes in one of four layouts, called *views*. Each larger view is a
//! strict superset of the smaller one:
//!
//! | Word | View 0     | View 1 | View 2 | View 3 |
//! |------|------------|--------|--------|--------|
//! | 0    | next       | next   | next   | next   |
//! | 1    | control    | control| control| control|
//! | 2    | address    | source | source | source |
//! | 3    |            | dest.  | dest.  | dest.  |
//! | 4    |            |        | config | config |
//! | 5    |            |        |        | block control |
//! | 6    |            |        |        | data stride |
//! | 7    |            |        |        | source microblock stride |
//! | 8    |            |        |        | destination microblock stride |
//!
//! A view 0 descriptor only updates one address. [`View0Src`] updates the
//! source address and [`View0Dst`] the destination address. Whatever a
//! descriptor doesn't carry, the channel keeps from the previous one.
//!
//! Every view type is a `#[repr(transparent)]` wrapper over its word
//! array. It never owns memory that the hardware reads: a
//! [`LinkedListTransfer`](crate::LinkedListTransfer) hands out `&mut`
//! views into its own buffer, and [`from_words`](View2::from_words)
//! overlays a view on any correctly sized word array.
//!
//! The *next* word, and the link bits in the *control* word, belong to
//! the chain. They're written when the chain is linked, and you can only
//! read them from a view.

use core::mem::size_of;

use crate::field::{Field, FieldValue};
use crate::ChannelConfig;

/// Descriptor layout identifier, as the hardware numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ViewType {
    /// Three words; one address.
    View0 = 0,
    /// Four words; source and destination.
    View1 = 1,
    /// Five words; adds the channel configuration.
    View2 = 2,
    /// Nine words; adds block control and strides.
    View3 = 3,
}

impl ViewType {
    /// Number of 32-bit words in this layout.
    pub const fn words(self) -> usize {
        match self {
            ViewType::View0 => 3,
            ViewType::View1 => 4,
            ViewType::View2 => 5,
            ViewType::View3 => 9,
        }
    }
}

impl FieldValue for ViewType {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(ViewType::View0),
            1 => Some(ViewType::View1),
            2 => Some(ViewType::View2),
            3 => Some(ViewType::View3),
            _ => None,
        }
    }
}

/// Something with an address the DMA controller can use.
///
/// Implemented for raw `u32` addresses, pointers, and references. Only
/// the address is captured; nothing is ever read or written through it.
/// That's what you want for volatile peripheral registers.
pub trait DmaAddress {
    /// The bus address.
    fn dma_address(self) -> u32;
}

impl DmaAddress for u32 {
    fn dma_address(self) -> u32 {
        self
    }
}

impl<T: ?Sized> DmaAddress for *const T {
    fn dma_address(self) -> u32 {
        self.cast::<()>() as usize as u32
    }
}

impl<T: ?Sized> DmaAddress for *mut T {
    fn dma_address(self) -> u32 {
        self.cast::<()>() as usize as u32
    }
}

impl<T: ?Sized> DmaAddress for &T {
    fn dma_address(self) -> u32 {
        (self as *const T).dma_address()
    }
}

impl<T: ?Sized> DmaAddress for &mut T {
    fn dma_address(self) -> u32 {
        (self as *const T).dma_address()
    }
}

//
// Word offsets, shared by all views that have the word.
//
pub(crate) const NEXT: usize = 0;
pub(crate) const CONTROL: usize = 1;
const SOURCE: usize = 2;
const CONFIGURATION: usize = 4;
const DATA_STRIDE: usize = 6;

/// Microblock length, in elements.
pub(crate) const UBLEN: Field<u32> = Field::new(0x00FF_FFFF, 0);
/// Fetch another descriptor after this one.
pub(crate) const NDE: Field<bool> = Field::new(0b1, 24);
/// The next descriptor updates the source address.
pub(crate) const NSEN: Field<bool> = Field::new(0b1, 25);
/// The next descriptor updates the destination address.
pub(crate) const NDEN: Field<bool> = Field::new(0b1, 26);
/// Layout of the next descriptor.
pub(crate) const NVIEW: Field<ViewType> = Field::new(0b11, 27);

/// All link bits of a control word.
pub(crate) const LINK_MASK: u32 = NDE.mask() | NSEN.mask() | NDEN.mask() | NVIEW.mask();

/// Next descriptor address; descriptors are word aligned.
pub(crate) const NDA: Field<u32> = Field::new(0x3FFF_FFFF, 2);

pub(crate) const SOURCE_DATA_STRIDE: Field<u32> = Field::new(0xFFFF, 0);
pub(crate) const DESTINATION_DATA_STRIDE: Field<u32> = Field::new(0xFFFF, 16);

/// Largest data length a single descriptor can describe.
pub const MAX_DATA_LENGTH: usize = UBLEN.mask() as usize;

/// Control bits that make the controller load a `view` next.
const fn fetch(view: ViewType, source: bool, destination: bool) -> u32 {
    let bits = NVIEW.write_bits(0, view as u32);
    let bits = NSEN.write_bits(bits, source as u32);
    NDEN.write_bits(bits, destination as u32)
}

mod sealed {
    pub trait Sealed {}
}

/// A descriptor layout.
///
/// This trait is sealed. It's implemented by [`View0Src`], [`View0Dst`],
/// [`View1`], [`View2`], and [`View3`].
pub trait View: sealed::Sealed + Copy + Default + 'static {
    /// The hardware layout identifier.
    const TYPE: ViewType;
    /// Backing words, exactly as the hardware reads them.
    type Data: Copy;
    /// Number of words in [`Data`](View::Data).
    const WORDS: usize;
    /// Link bits the *previous* descriptor needs to load this one.
    #[doc(hidden)]
    const FETCH: u32;
    /// An all-zero descriptor.
    #[doc(hidden)]
    const ZEROED: Self;

    /// The descriptor words.
    fn words(&self) -> &[u32];
    #[doc(hidden)]
    fn words_mut(&mut self) -> &mut [u32];
    /// Overlay a view on `words`, which must be exactly `WORDS` long.
    #[doc(hidden)]
    fn overlay(words: &mut [u32]) -> &mut Self;
}

/// A view that can start a chain.
///
/// The first descriptor of a linked list must carry the channel
/// configuration, so only [`View2`] and [`View3`] qualify.
pub trait ChainHead: View {}

macro_rules! view {
    (
        $(#[$attr:meta])*
        $name:ident, $view:ident, $words:literal,
        fetch_source: $src:literal, fetch_destination: $dst:literal
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[repr(transparent)]
        pub struct $name {
            data: [u32; $words],
        }

        const _: () = assert!(size_of::<$name>() == size_of::<[u32; $words]>());
        const _: () = assert!(ViewType::$view.words() == $words);

        impl sealed::Sealed for $name {}

        impl View for $name {
            const TYPE: ViewType = ViewType::$view;
            type Data = [u32; $words];
            const WORDS: usize = $words;
            const FETCH: u32 = fetch(ViewType::$view, $src, $dst);
            const ZEROED: Self = Self::new();

            fn words(&self) -> &[u32] {
                &self.data
            }
            fn words_mut(&mut self) -> &mut [u32] {
                &mut self.data
            }
            fn overlay(words: &mut [u32]) -> &mut Self {
                assert_eq!(words.len(), $words);
                // Safety: length checked above. Self is repr(transparent)
                // over an array of exactly that many words.
                unsafe { &mut *words.as_mut_ptr().cast::<Self>() }
            }
        }

        impl $name {
            /// A zeroed descriptor.
            pub const fn new() -> Self {
                Self { data: [0; $words] }
            }

            /// Overlay this view on caller-owned words.
            ///
            /// The view aliases `words`; nothing is copied.
            pub fn from_words(words: &mut [u32; $words]) -> &mut Self {
                // Safety: Self is repr(transparent) over exactly this array.
                unsafe { &mut *(words as *mut [u32; $words]).cast::<Self>() }
            }

            /// The raw descriptor words.
            pub const fn as_words(&self) -> &[u32; $words] {
                &self.data
            }

            /// Set the number of elements to transfer.
            ///
            /// This is a count of data-width elements, not bytes. Zero is
            /// allowed. `length` must not exceed [`MAX_DATA_LENGTH`].
            pub fn set_data_length(&mut self, length: usize) {
                debug_assert!(length <= MAX_DATA_LENGTH);
                let control = &mut self.data[CONTROL];
                *control = UBLEN.write_bits(*control, length as u32);
            }

            /// The number of elements to transfer.
            pub fn data_length(&self) -> usize {
                UBLEN.read_bits(self.data[CONTROL]) as usize
            }

            /// Address of the descriptor that follows this one.
            ///
            /// Only meaningful once the chain is linked, and only when
            /// [`has_next`](Self::has_next) is true.
            pub fn next_descriptor(&self) -> u32 {
                self.data[NEXT] & NDA.mask()
            }

            /// Indicates if the controller fetches another descriptor
            /// after this one.
            pub fn has_next(&self) -> bool {
                NDE.get(self.data[CONTROL]).unwrap_or(false)
            }

            /// Layout of the descriptor that follows this one.
            pub fn next_view(&self) -> Option<ViewType> {
                self.has_next()
                    .then(|| NVIEW.get(self.data[CONTROL]))
                    .flatten()
            }
        }
    };
}

view!(
    /// View 0 descriptor that updates the source address.
    ///
    /// The destination address, configuration, and strides stay as the
    /// previous descriptor left them.
    View0Src, View0, 3,
    fetch_source: true, fetch_destination: false
);

view!(
    /// View 0 descriptor that updates the destination address.
    ///
    /// The source address, configuration, and strides stay as the
    /// previous descriptor left them.
    View0Dst, View0, 3,
    fetch_source: false, fetch_destination: true
);

view!(
    /// View 1 descriptor: source and destination.
    View1, View1, 4,
    fetch_source: true, fetch_destination: true
);

view!(
    /// View 2 descriptor: source, destination, and configuration.
    View2, View2, 5,
    fetch_source: true, fetch_destination: true
);

view!(
    /// View 3 descriptor: everything a channel can be programmed with.
    View3, View3, 9,
    fetch_source: true, fetch_destination: true
);

impl ChainHead for View2 {}
impl ChainHead for View3 {}

macro_rules! source_address {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// Set the source address.
                pub fn set_source_address(&mut self, address: impl DmaAddress) {
                    self.data[SOURCE] = address.dma_address();
                }

                /// The source address.
                pub fn source_address(&self) -> u32 {
                    self.data[SOURCE]
                }
            }
        )+
    };
}

macro_rules! destination_address {
    ($($name:ident @ $word:literal),+) => {
        $(
            impl $name {
                /// Set the destination address.
                pub fn set_destination_address(&mut self, address: impl DmaAddress) {
                    self.data[$word] = address.dma_address();
                }

                /// The destination address.
                pub fn destination_address(&self) -> u32 {
                    self.data[$word]
                }
            }
        )+
    };
}

macro_rules! configuration {
    ($($name:ident),+) => {
        $(
            impl $name {
                /// Set the channel configuration loaded with this descriptor.
                pub fn set_configuration(&mut self, config: ChannelConfig) {
                    self.data[CONFIGURATION] = config.bits();
                }

                /// The channel configuration loaded with this descriptor.
                pub fn configuration(&self) -> ChannelConfig {
                    ChannelConfig::from_bits(self.data[CONFIGURATION])
                }
            }
        )+
    };
}

source_address!(View0Src, View1, View2, View3);
destination_address!(View0Dst @ 2, View1 @ 3, View2 @ 3, View3 @ 3);
configuration!(View2, View3);

impl View3 {
    /// Set the source data stride, in bytes.
    ///
    /// Applies with [`AddressingMode::Strided`](crate::AddressingMode::Strided).
    pub fn set_source_data_stride(&mut self, stride: i16) {
        let word = &mut self.data[DATA_STRIDE];
        *word = SOURCE_DATA_STRIDE.write_bits(*word, stride as u16 as u32);
    }

    /// The source data stride, in bytes.
    pub fn source_data_stride(&self) -> i16 {
        SOURCE_DATA_STRIDE.read_bits(self.data[DATA_STRIDE]) as u16 as i16
    }

    /// Set the destination data stride, in bytes.
    pub fn set_destination_data_stride(&mut self, stride: i16) {
        let word = &mut self.data[DATA_STRIDE];
        *word = DESTINATION_DATA_STRIDE.write_bits(*word, stride as u16 as u32);
    }

    /// The destination data stride, in bytes.
    pub fn destination_data_stride(&self) -> i16 {
        DESTINATION_DATA_STRIDE.read_bits(self.data[DATA_STRIDE]) as u16 as i16
    }
}

/// Write the link words of one descriptor.
///
/// `next` is the address and fetch bits of the successor, or `None` to
/// end the chain here. The data length is preserved.
pub(crate) fn link(words: &mut [u32], next: Option<(u32, u32)>) {
    let control = words[CONTROL] & !LINK_MASK;
    match next {
        Some((address, fetch)) => {
            debug_assert!(address & !NDA.mask() == 0, "descriptors are word aligned");
            words[NEXT] = address & NDA.mask();
            words[CONTROL] = control | fetch | NDE.mask();
        }
        None => {
            words[NEXT] = 0;
            words[CONTROL] = control;
        }
    }
}
