//! XDMAC register blocks and fields

use super::{RORegister, RWRegister, WORegister};

/// Number of channel register clusters in the XDMAC.
pub const CHANNEL_CLUSTERS: usize = 24;

/// XDMAC global registers, followed by the channel clusters.
#[repr(C)]
pub struct RegisterBlock {
    /// Global Type Register
    pub GTYPE: RORegister<u32>,
    /// Global Configuration Register
    pub GCFG: RWRegister<u32>,
    /// Global Weighted Arbiter Configuration Register
    pub GWAC: RWRegister<u32>,
    /// Global Interrupt Enable Register
    pub GIE: WORegister<u32>,
    /// Global Interrupt Disable Register
    pub GID: WORegister<u32>,
    /// Global Interrupt Mask Register
    pub GIM: RORegister<u32>,
    /// Global Interrupt Status Register
    pub GIS: RORegister<u32>,
    /// Global Channel Enable Register
    pub GE: WORegister<u32>,
    /// Global Channel Disable Register
    pub GD: WORegister<u32>,
    /// Global Channel Status Register
    pub GS: RORegister<u32>,
    /// Global Channel Read Suspend Register
    pub GRS: RWRegister<u32>,
    /// Global Channel Write Suspend Register
    pub GWS: RWRegister<u32>,
    /// Global Channel Read Write Suspend Register
    pub GRWS: WORegister<u32>,
    /// Global Channel Read Write Resume Register
    pub GRWR: WORegister<u32>,
    /// Global Channel Software Request Register
    pub GSWR: WORegister<u32>,
    /// Global Channel Software Request Status Register
    pub GSWS: RORegister<u32>,
    /// Global Channel Software Flush Request Register
    pub GSWF: WORegister<u32>,
    _reserved0: [u32; 3],
    /// Channel registers
    pub CHANNELS: [channel::RegisterBlock; CHANNEL_CLUSTERS],
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, GSWF) == 0x40);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, CHANNELS) == 0x50);
const _: () = assert!(core::mem::size_of::<RegisterBlock>() == 0x50 + 0x40 * 24);

/// Per-channel registers.
pub mod channel {
    use crate::ral::{field, RORegister, RWRegister, WORegister};

    /// One channel cluster, 64 bytes.
    #[repr(C)]
    pub struct RegisterBlock {
        /// Channel Interrupt Enable Register
        pub CIE: WORegister<u32>,
        /// Channel Interrupt Disable Register
        pub CID: WORegister<u32>,
        /// Channel Interrupt Mask Register
        pub CIM: RORegister<u32>,
        /// Channel Interrupt Status Register
        ///
        /// Reading clears the status.
        pub CIS: RORegister<u32>,
        /// Channel Source Address Register
        pub CSA: RWRegister<u32>,
        /// Channel Destination Address Register
        pub CDA: RWRegister<u32>,
        /// Channel Next Descriptor Address Register
        pub CNDA: RWRegister<u32>,
        /// Channel Next Descriptor Control Register
        pub CNDC: RWRegister<u32>,
        /// Channel Microblock Control Register
        pub CUBC: RWRegister<u32>,
        /// Channel Block Control Register
        pub CBC: RWRegister<u32>,
        /// Channel Configuration Register
        pub CC: RWRegister<u32>,
        /// Channel Data Stride Memory Set Pattern Register
        pub CDS_MSP: RWRegister<u32>,
        /// Channel Source Microblock Stride Register
        pub CSUS: RWRegister<u32>,
        /// Channel Destination Microblock Stride Register
        pub CDUS: RWRegister<u32>,
        _reserved0: [u32; 2],
    }

    const _: () = assert!(core::mem::offset_of!(RegisterBlock, CNDA) == 0x18);
    const _: () = assert!(core::mem::offset_of!(RegisterBlock, CC) == 0x28);
    const _: () = assert!(core::mem::size_of::<RegisterBlock>() == 0x40);

    pub mod CNDA {
        super::field!(
            /// Channel x Next Descriptor Interface
            NDAIF, 0, 1
        );
        super::field!(
            /// Channel x Next Descriptor Address, word aligned
            NDA, 2, 30
        );
    }

    pub mod CNDC {
        super::field!(
            /// Channel x Next Descriptor Enable
            NDE, 0, 1
        );
        super::field!(
            /// Channel x Next Descriptor Source Update
            NDSUP, 1, 1
        );
        super::field!(
            /// Channel x Next Descriptor Destination Update
            NDDUP, 2, 1
        );
        super::field!(
            /// Channel x Next Descriptor View
            NDVIEW, 3, 2
        );
    }

    pub mod CUBC {
        super::field!(
            /// Channel x Microblock Length
            UBLEN, 0, 24
        );
    }
}
