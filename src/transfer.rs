//! Transfer descriptions
//!
//! A [`BlockTransfer`] is one transfer, programmed straight into the
//! channel registers. A [`LinkedListTransfer`] is a chain of descriptors
//! in memory that the channel walks on its own.
//!
//! Both are plain data until you hand them to a
//! [`Channel`](crate::channel::Channel).

use core::fmt;
use core::mem::{align_of, size_of};

use crate::descriptor::{
    self, ChainHead, DmaAddress, View, ViewType, DESTINATION_DATA_STRIDE, MAX_DATA_LENGTH,
    SOURCE_DATA_STRIDE,
};
use crate::ChannelConfig;

/// A single transfer, without descriptors.
///
/// Equivalent to a one-descriptor chain that isn't circular. Arming a
/// channel with a `BlockTransfer` copies it into the channel registers,
/// so the value itself doesn't need to outlive
/// [`set_transfer`](crate::channel::Channel::set_transfer). The memory it
/// points at does.
///
/// ```
/// use same70_xdmac::{
///     request, AddressingMode, BlockTransfer, ChannelConfig, DataWidth,
///     PeripheralDirection, TransferType,
/// };
///
/// static SAMPLES: [u16; 50] = [0; 50];
/// const DACC_CDR0: u32 = 0x4003_C01C;
///
/// let mut transfer = BlockTransfer::new();
/// transfer.set_source_address(&SAMPLES);
/// transfer.set_destination_address(DACC_CDR0);
/// transfer.set_data_length(SAMPLES.len());
/// transfer.set_configuration(
///     ChannelConfig::new()
///         .with(ChannelConfig::TRANSFER_TYPE, TransferType::Peripheral)
///         .with(ChannelConfig::PERIPHERAL_DIRECTION, PeripheralDirection::MemoryToPeripheral)
///         .with(ChannelConfig::DATA_WIDTH, DataWidth::HalfWord)
///         .with(ChannelConfig::SOURCE_ADDRESSING_MODE, AddressingMode::Incrementing)
///         .with(ChannelConfig::DMA_REQUEST, request::Dacc::TX),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockTransfer {
    source: u32,
    destination: u32,
    length: u32,
    config: ChannelConfig,
    data_stride: u32,
}

impl BlockTransfer {
    /// An empty transfer.
    pub const fn new() -> Self {
        Self {
            source: 0,
            destination: 0,
            length: 0,
            config: ChannelConfig::new(),
            data_stride: 0,
        }
    }

    /// Set the source address.
    pub fn set_source_address(&mut self, address: impl DmaAddress) {
        self.source = address.dma_address();
    }

    /// The source address.
    pub const fn source_address(&self) -> u32 {
        self.source
    }

    /// Set the destination address.
    pub fn set_destination_address(&mut self, address: impl DmaAddress) {
        self.destination = address.dma_address();
    }

    /// The destination address.
    pub const fn destination_address(&self) -> u32 {
        self.destination
    }

    /// Set the number of elements to transfer.
    ///
    /// `length` must not exceed [`MAX_DATA_LENGTH`].
    pub fn set_data_length(&mut self, length: usize) {
        debug_assert!(length <= MAX_DATA_LENGTH);
        self.length = (length & MAX_DATA_LENGTH) as u32;
    }

    /// The number of elements to transfer.
    pub const fn data_length(&self) -> usize {
        self.length as usize
    }

    /// Set the channel configuration.
    pub fn set_configuration(&mut self, config: ChannelConfig) {
        self.config = config;
    }

    /// The channel configuration.
    pub const fn configuration(&self) -> ChannelConfig {
        self.config
    }

    /// Set the source data stride, in bytes.
    pub fn set_source_data_stride(&mut self, stride: i16) {
        self.data_stride = SOURCE_DATA_STRIDE.write_bits(self.data_stride, stride as u16 as u32);
    }

    /// The source data stride, in bytes.
    pub const fn source_data_stride(&self) -> i16 {
        SOURCE_DATA_STRIDE.read_bits(self.data_stride) as u16 as i16
    }

    /// Set the destination data stride, in bytes.
    pub fn set_destination_data_stride(&mut self, stride: i16) {
        self.data_stride =
            DESTINATION_DATA_STRIDE.write_bits(self.data_stride, stride as u16 as u32);
    }

    /// The destination data stride, in bytes.
    pub const fn destination_data_stride(&self) -> i16 {
        DESTINATION_DATA_STRIDE.read_bits(self.data_stride) as u16 as i16
    }

    /// The `CDS_MSP` register value.
    pub(crate) const fn data_stride_bits(&self) -> u32 {
        self.data_stride
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Storage for one descriptor, followed by the rest of the chain.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Node<H, T> {
    pub head: H,
    pub tail: T,
}

/// End of the chain storage.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct End;

/// A sequence of descriptor views that can form a chain.
///
/// Implemented for tuples of one through eight [`View`]s whose first
/// element is a [`ChainHead`]. This trait is sealed.
pub trait Descriptors: sealed::Sealed {
    /// Contiguous storage for every descriptor, without padding.
    #[doc(hidden)]
    type Storage;
    /// One `&mut` view per descriptor.
    type Views<'a>;

    /// Total number of words in the chain.
    const WORDS: usize;
    /// Layout of the first descriptor.
    const HEAD: ViewType;
    /// Link bits needed to load each descriptor, by position.
    #[doc(hidden)]
    const FETCH: &'static [u32];
    /// Words in each descriptor, by position.
    #[doc(hidden)]
    const SIZES: &'static [usize];
    /// Number of descriptors.
    const LEN: usize = Self::SIZES.len();
    #[doc(hidden)]
    const ZEROED: Self::Storage;

    /// Split the chain words into views.
    #[doc(hidden)]
    fn views(words: &mut [u32]) -> Self::Views<'_>;
}

macro_rules! storage {
    ($head:ident $(, $tail:ident)*) => { Node<$head, storage!($($tail),*)> };
    () => { End };
}

macro_rules! zeroed {
    ($head:ident $(, $tail:ident)*) => {
        Node {
            head: <$head as View>::ZEROED,
            tail: zeroed!($($tail),*),
        }
    };
    () => { End };
}

macro_rules! descriptors {
    ($head:ident $h:ident $(, $ty:ident $v:ident)*) => {
        impl<$head: ChainHead $(, $ty: View)*> sealed::Sealed for ($head, $($ty,)*) {}

        impl<$head: ChainHead $(, $ty: View)*> Descriptors for ($head, $($ty,)*) {
            type Storage = storage!($head $(, $ty)*);
            type Views<'a> = (&'a mut $head, $(&'a mut $ty,)*);

            const WORDS: usize = $head::WORDS $(+ $ty::WORDS)*;
            const HEAD: ViewType = $head::TYPE;
            const FETCH: &'static [u32] = &[$head::FETCH $(, $ty::FETCH)*];
            const SIZES: &'static [usize] = &[$head::WORDS $(, $ty::WORDS)*];
            const ZEROED: Self::Storage = zeroed!($head $(, $ty)*);

            fn views(words: &mut [u32]) -> Self::Views<'_> {
                let ($h, rest) = words.split_at_mut($head::WORDS);
                $(
                    let ($v, rest) = rest.split_at_mut($ty::WORDS);
                )*
                debug_assert!(rest.is_empty());
                ($head::overlay($h), $($ty::overlay($v),)*)
            }
        }
    };
}

descriptors!(A a);
descriptors!(A a, B b);
descriptors!(A a, B b, C c);
descriptors!(A a, B b, C c, D d);
descriptors!(A a, B b, C c, D d, E e);
descriptors!(A a, B b, C c, D d, E e, F f);
descriptors!(A a, B b, C c, D d, E e, F f, G g);
descriptors!(A a, B b, C c, D d, E e, F f, G g, H h);

/// A chain of descriptors, stored contiguously.
///
/// `D` is a tuple of [`View`] types, one per descriptor, in chain order.
/// The first must be [`View2`](crate::View2) or [`View3`](crate::View3),
/// since the first descriptor has to carry the channel configuration.
///
/// ```
/// use same70_xdmac::{
///     request, AddressingMode, ChannelConfig, DataWidth, LinkedListTransfer,
///     PeripheralDirection, TransferType, View0Src, View2,
/// };
///
/// static SIGNAL_A: [u16; 50] = [0; 50];
/// static SIGNAL_B: [u16; 50] = [0; 50];
/// const DACC_CDR0: u32 = 0x4003_C01C;
///
/// let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
/// let (first, second) = transfer.descriptors();
///
/// first.set_configuration(
///     ChannelConfig::new()
///         .with(ChannelConfig::TRANSFER_TYPE, TransferType::Peripheral)
///         .with(ChannelConfig::PERIPHERAL_DIRECTION, PeripheralDirection::MemoryToPeripheral)
///         .with(ChannelConfig::DATA_WIDTH, DataWidth::HalfWord)
///         .with(ChannelConfig::SOURCE_ADDRESSING_MODE, AddressingMode::Incrementing)
///         .with(ChannelConfig::DMA_REQUEST, request::Dacc::TX),
/// );
/// first.set_source_address(&SIGNAL_A);
/// first.set_destination_address(DACC_CDR0);
/// first.set_data_length(SIGNAL_A.len());
///
/// // Same configuration and destination; only the source changes.
/// second.set_source_address(&SIGNAL_B);
/// second.set_data_length(SIGNAL_B.len());
///
/// transfer.set_circular_mode(true);
/// ```
///
/// # Shared fields
///
/// Fields that a descriptor doesn't carry keep the value loaded by an
/// earlier descriptor:
///
/// - [`View0Src`](crate::View0Src) keeps the destination address,
///   configuration, and strides.
/// - [`View0Dst`](crate::View0Dst) keeps the source address,
///   configuration, and strides.
/// - [`View1`](crate::View1) keeps the configuration and strides.
/// - [`View2`](crate::View2) keeps the strides. When a chain starts with a
///   `View2`, arming the channel zeroes the strides.
///
/// # Linking
///
/// The chain is linked (next addresses and view bits written) by
/// [`set_circular_mode`](Self::set_circular_mode) and again whenever it's
/// armed on a channel. Moving the transfer before arming is fine. Once
/// armed, the [`Armed`](crate::channel::Armed) guard borrows the transfer,
/// so it can't move or drop until the guard is gone.
///
/// # Invalid chains
///
/// A chain needs at least one descriptor:
///
/// ```compile_fail
/// let _ = same70_xdmac::LinkedListTransfer::<()>::new();
/// ```
///
/// The first descriptor must be a `View2` or `View3`:
///
/// ```compile_fail
/// use same70_xdmac::{LinkedListTransfer, View1, View2};
/// let _ = LinkedListTransfer::<(View1, View2)>::new();
/// ```
pub struct LinkedListTransfer<D: Descriptors> {
    storage: D::Storage,
    circular: bool,
}

impl<D: Descriptors> LinkedListTransfer<D> {
    /// Number of descriptors in the chain.
    pub const LEN: usize = D::LEN;

    /// The hardware reads the storage as a packed array of words.
    const LAYOUT: () = assert!(
        size_of::<D::Storage>() == D::WORDS * size_of::<u32>()
            && align_of::<D::Storage>() == align_of::<u32>(),
        "descriptor storage must be packed words"
    );

    /// A zeroed, non-circular chain.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT;
        Self {
            storage: D::ZEROED,
            circular: false,
        }
    }

    /// One view per descriptor, aliasing the chain storage.
    ///
    /// The views come back as a tuple in chain order. To reach a single
    /// descriptor by position, index the tuple:
    ///
    /// ```
    /// use same70_xdmac::{LinkedListTransfer, View0Src, View2};
    ///
    /// let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
    /// transfer.descriptors().1.set_data_length(25);
    /// assert_eq!(transfer.descriptors().1.data_length(), 25);
    /// ```
    pub fn descriptors(&mut self) -> D::Views<'_> {
        D::views(self.words_mut())
    }

    /// Loop back to the first descriptor after the last one, or stop.
    ///
    /// Links the chain in place.
    pub fn set_circular_mode(&mut self, circular: bool) {
        self.circular = circular;
        self.link();
    }

    /// Indicates if the chain loops.
    pub const fn is_circular(&self) -> bool {
        self.circular
    }

    /// Address of the first descriptor.
    pub fn address(&self) -> u32 {
        (&self.storage as *const D::Storage).dma_address()
    }

    /// The chain, as the hardware sees it.
    pub fn words(&self) -> &[u32] {
        // Safety: LAYOUT guarantees that storage is exactly WORDS
        // packed, aligned words.
        unsafe {
            core::slice::from_raw_parts(
                (&self.storage as *const D::Storage).cast::<u32>(),
                D::WORDS,
            )
        }
    }

    fn words_mut(&mut self) -> &mut [u32] {
        // Safety: see words().
        unsafe {
            core::slice::from_raw_parts_mut(
                (&mut self.storage as *mut D::Storage).cast::<u32>(),
                D::WORDS,
            )
        }
    }

    /// Write next addresses and link bits for the current location.
    pub(crate) fn link(&mut self) {
        let base = self.address();
        let circular = self.circular;
        let words = self.words_mut();

        let mut offset = 0;
        for (index, &size) in D::SIZES.iter().enumerate() {
            let next = if index + 1 < D::SIZES.len() {
                let address = base.wrapping_add(((offset + size) * size_of::<u32>()) as u32);
                Some((address, D::FETCH[index + 1]))
            } else if circular {
                Some((base, D::FETCH[0]))
            } else {
                None
            };
            descriptor::link(&mut words[offset..offset + size], next);
            offset += size;
        }
    }
}

impl<D: Descriptors> Default for LinkedListTransfer<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Descriptors> fmt::Debug for LinkedListTransfer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedListTransfer")
            .field("descriptors", &D::LEN)
            .field("circular", &self.circular)
            .field("words", &self.words())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        request, AddressingMode, DataWidth, PeripheralDirection, TransferType, View0Dst,
        View0Src, View1, View2, View3,
    };

    fn dac_config() -> ChannelConfig {
        ChannelConfig::new()
            .with(ChannelConfig::TRANSFER_TYPE, TransferType::Peripheral)
            .with(
                ChannelConfig::PERIPHERAL_DIRECTION,
                PeripheralDirection::MemoryToPeripheral,
            )
            .with(ChannelConfig::DATA_WIDTH, DataWidth::HalfWord)
            .with(ChannelConfig::SOURCE_ADDRESSING_MODE, AddressingMode::Incrementing)
            .with(ChannelConfig::DMA_REQUEST, request::Dacc::TX)
    }

    #[test]
    fn storage_is_the_sum_of_views() {
        type Chain = (View2, View0Src, View0Dst, View1, View3);
        assert_eq!(<Chain as Descriptors>::WORDS, 5 + 3 + 3 + 4 + 9);
        assert_eq!(
            size_of::<<Chain as Descriptors>::Storage>(),
            <Chain as Descriptors>::WORDS * size_of::<u32>()
        );
        assert_eq!(LinkedListTransfer::<Chain>::LEN, 5);
        assert_eq!(<Chain as Descriptors>::SIZES, &[5, 3, 3, 4, 9]);
        assert_eq!(<Chain as Descriptors>::HEAD, ViewType::View2);

        let transfer = LinkedListTransfer::<Chain>::new();
        assert_eq!(transfer.words().len(), 24);
        assert!(transfer.words().iter().all(|word| *word == 0));

        type Single = (View3,);
        assert_eq!(<Single as Descriptors>::WORDS, 9);
        assert_eq!(<Single as Descriptors>::HEAD, ViewType::View3);
    }

    #[test]
    fn views_alias_storage() {
        let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
        let (first, second) = transfer.descriptors();
        first.set_configuration(dac_config());
        first.set_source_address(0x0040_1000u32);
        first.set_destination_address(0x4003_C01Cu32);
        first.set_data_length(50);
        second.set_source_address(0x0040_2000u32);
        second.set_data_length(25);

        assert_eq!(
            transfer.words(),
            &[
                0,
                50,
                0x0040_1000,
                0x4003_C01C,
                dac_config().bits(),
                0,
                25,
                0x0040_2000
            ]
        );
    }

    #[test]
    fn one_descriptor_by_position() {
        let mut transfer = LinkedListTransfer::<(View3, View1, View0Dst)>::new();
        transfer.descriptors().2.set_destination_address(0x2040_1000u32);
        transfer.descriptors().1.set_data_length(8);

        assert_eq!(&transfer.words()[13..16], &[0, 0, 0x2040_1000]);
        assert_eq!(transfer.descriptors().1.data_length(), 8);
        assert_eq!(transfer.descriptors().0.data_length(), 0);
    }

    #[test]
    fn circular_chain_loops_to_the_head() {
        let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
        transfer.set_circular_mode(true);
        assert!(transfer.is_circular());

        let head = transfer.address();
        let (first, second) = transfer.descriptors();
        assert!(first.has_next());
        assert_eq!(first.next_descriptor(), head.wrapping_add(5 * 4));
        assert_eq!(first.next_view(), Some(ViewType::View0));
        assert!(second.has_next());
        assert_eq!(second.next_descriptor(), head);
        assert_eq!(second.next_view(), Some(ViewType::View2));
    }

    #[test]
    fn terminal_chain_ends() {
        let mut transfer = LinkedListTransfer::<(View2, View0Src)>::new();
        transfer.set_circular_mode(true);
        transfer.set_circular_mode(false);
        assert!(!transfer.is_circular());

        let head = transfer.address();
        let (first, second) = transfer.descriptors();
        assert_eq!(first.next_descriptor(), head.wrapping_add(5 * 4));
        assert!(!second.has_next());
        assert_eq!(second.next_descriptor(), 0);
    }

    #[test]
    fn single_circular_descriptor_points_at_itself() {
        let mut transfer = LinkedListTransfer::<(View3,)>::new();
        let (only,) = transfer.descriptors();
        only.set_data_length(2);
        transfer.set_circular_mode(true);

        let head = transfer.address();
        let (only,) = transfer.descriptors();
        assert_eq!(only.next_descriptor(), head);
        assert_eq!(only.next_view(), Some(ViewType::View3));
        assert_eq!(only.data_length(), 2);
    }

    #[test]
    fn linking_keeps_descriptor_fields() {
        let mut transfer = LinkedListTransfer::<(View3, View1, View0Dst)>::new();
        {
            let (first, second, third) = transfer.descriptors();
            first.set_data_length(10);
            first.set_source_data_stride(8);
            second.set_data_length(20);
            second.set_destination_address(0x2040_0000u32);
            third.set_data_length(30);
            third.set_destination_address(0x2040_1000u32);
        }
        transfer.set_circular_mode(false);

        let (first, second, third) = transfer.descriptors();
        assert_eq!(first.data_length(), 10);
        assert_eq!(first.source_data_stride(), 8);
        assert_eq!(first.next_view(), Some(ViewType::View1));
        assert_eq!(second.data_length(), 20);
        assert_eq!(second.destination_address(), 0x2040_0000);
        assert_eq!(second.next_view(), Some(ViewType::View0));
        assert_eq!(third.data_length(), 30);
        assert_eq!(third.destination_address(), 0x2040_1000);
        assert!(!third.has_next());
    }

    #[test]
    fn block_transfer_fields() {
        let mut transfer = BlockTransfer::new();
        transfer.set_source_address(0x2040_0000u32);
        transfer.set_destination_address(0x4002_4018u32);
        transfer.set_data_length(0);
        transfer.set_configuration(dac_config());
        transfer.set_source_data_stride(-4);
        transfer.set_destination_data_stride(i16::MAX);

        assert_eq!(transfer.source_address(), 0x2040_0000);
        assert_eq!(transfer.destination_address(), 0x4002_4018);
        assert_eq!(transfer.data_length(), 0);
        assert_eq!(transfer.configuration(), dac_config());
        assert_eq!(transfer.source_data_stride(), -4);
        assert_eq!(transfer.destination_data_stride(), i16::MAX);
        assert_eq!(transfer.data_stride_bits(), 0x7FFF_FFFC);
    }
}
