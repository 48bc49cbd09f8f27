//! Register blocks in plain RAM, standing in for the XDMAC and PMC.
//!
//! Registers don't act like hardware here. Writes stick, status bits
//! only change when a test pokes them, and reads never clear anything.

use core::mem::MaybeUninit;

use crate::{ral, Dma};

pub(crate) const CHANNELS: usize = 24;

pub(crate) struct Fake {
    pub(crate) dma: &'static Dma<CHANNELS>,
    pub(crate) xdmac: &'static ral::xdmac::RegisterBlock,
    pub(crate) pmc: &'static ral::pmc::RegisterBlock,
}

fn leak_zeroed<T>() -> &'static T {
    let block: &'static mut MaybeUninit<T> = Box::leak(Box::new(MaybeUninit::zeroed()));
    // Safety: register blocks are u32 cells, all valid when zero.
    unsafe { &*block.as_ptr() }
}

/// A fresh, zeroed controller.
pub(crate) fn fake() -> Fake {
    let xdmac = leak_zeroed::<ral::xdmac::RegisterBlock>();
    let pmc = leak_zeroed::<ral::pmc::RegisterBlock>();
    // Safety: both blocks are leaked, so they're valid forever.
    let dma = unsafe {
        Dma::new(
            (xdmac as *const ral::xdmac::RegisterBlock).cast(),
            (pmc as *const ral::pmc::RegisterBlock).cast(),
        )
    };
    Fake {
        dma: Box::leak(Box::new(dma)),
        xdmac,
        pmc,
    }
}

/// Read any register, including write-only ones.
pub(crate) fn peek<R>(register: &R) -> u32 {
    // Safety: every register is a single u32 cell.
    unsafe { (register as *const R).cast::<u32>().read_volatile() }
}

/// Write any register, including read-only ones.
pub(crate) fn poke<R>(register: &R, value: u32) {
    // Safety: every register is a u32 in an UnsafeCell.
    unsafe { (register as *const R).cast_mut().cast::<u32>().write_volatile(value) }
}
