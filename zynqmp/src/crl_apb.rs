//! # Low-power domain clock and reset control (CRL_APB)
pub const CRL_APB_BASE_ADDR: usize = 0xFF5E_0000;

pub const PCAP_CLK_CTRL_ADDR: usize = CRL_APB_BASE_ADDR + 0xA4;
pub const ADMA_CLK_CTRL_ADDR: usize = CRL_APB_BASE_ADDR + 0xB8;

static_assertions::const_assert_eq!(PCAP_CLK_CTRL_ADDR, 0xFF5E_00A4);
static_assertions::const_assert_eq!(ADMA_CLK_CTRL_ADDR, 0xFF5E_00B8);

pub const PCAP_CLK_EN_MASK: u32 = 0x0100_0000;
pub const ADMA_CLK_EN_MASK: u32 = 0x0100_0000;

/// Common layout of the reference clock control registers. Only the clock gate is modelled,
/// the divisor and source fields are left untouched.
#[bitbybit::bitfield(u32, debug)]
pub struct ClockControl {
    #[bit(24, rw)]
    clk_act: bool,
}
