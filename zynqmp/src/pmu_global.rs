//! # PMU global registers
//!
//! Power-up and isolation requests for the PL power domain.
pub const PMU_GLOBAL_BASE_ADDR: usize = 0xFFD8_0000;

pub const PWRUP_STATUS_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x110;
pub const PWRUP_EN_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x118;
pub const PWRUP_TRIG_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x120;

pub const ISO_STATUS_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x310;
pub const ISO_INT_EN_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x318;
pub const ISO_TRIG_ADDR: usize = PMU_GLOBAL_BASE_ADDR + 0x320;

static_assertions::const_assert_eq!(PWRUP_TRIG_ADDR, 0xFFD8_0120);
static_assertions::const_assert_eq!(ISO_STATUS_ADDR, 0xFFD8_0310);

pub const PWR_PL_MASK: u32 = 0x0080_0000;
pub const ISO_PL_MASK: u32 = 0x0000_0002;
pub const ISO_PL_NON_PCAP_MASK: u32 = 0x0000_0004;

/// Layout shared by the PWRUP_STATUS, PWRUP_EN and PWRUP_TRIG registers.
#[bitbybit::bitfield(u32, debug)]
pub struct PowerState {
    #[bit(23, rw)]
    pl: bool,
}

/// Layout shared by the ISO_STATUS, ISO_INT_EN and ISO_TRIG registers.
///
/// In the status register, a set bit means that the isolation is still active.
#[bitbybit::bitfield(u32, debug)]
#[derive(PartialEq, Eq)]
pub struct Isolation {
    #[bit(2, rw)]
    pl_non_pcap: bool,
    #[bit(1, rw)]
    pl: bool,
}

impl Isolation {
    /// All isolation bits of the PL domain.
    pub const PL_ALL: Self = Self::ZERO.with_pl(true).with_pl_non_pcap(true);

    #[inline]
    pub const fn pl_isolated(&self) -> bool {
        self.pl() || self.pl_non_pcap()
    }
}
