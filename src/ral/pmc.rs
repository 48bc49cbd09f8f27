//! Power management controller, peripheral clock gates only
//!
//! The XDMAC needs its peripheral clock before any register
//! write sticks. That's the only thing we ask of the PMC, so
//! the rest of the block is reserved space.

use super::{RORegister, WORegister};

/// PMC peripheral clock registers
#[repr(C)]
pub struct RegisterBlock {
    _reserved0: [u32; 4],
    /// Peripheral Clock Enable Register 0
    pub PCER0: WORegister<u32>,
    /// Peripheral Clock Disable Register 0
    pub PCDR0: WORegister<u32>,
    /// Peripheral Clock Status Register 0
    pub PCSR0: RORegister<u32>,
    _reserved1: [u32; 57],
    /// Peripheral Clock Enable Register 1
    pub PCER1: WORegister<u32>,
    /// Peripheral Clock Disable Register 1
    pub PCDR1: WORegister<u32>,
    /// Peripheral Clock Status Register 1
    pub PCSR1: RORegister<u32>,
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, PCER0) == 0x10);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, PCER1) == 0x100);

impl RegisterBlock {
    /// Enable the clock of peripheral `id`.
    pub fn enable_peripheral_clock(&self, id: u32) {
        if id < 32 {
            self.PCER0.write(1 << id);
        } else {
            self.PCER1.write(1 << (id - 32));
        }
    }
}
