//! # GPIO bank 5 registers
//!
//! Bank 5 is an EMIO bank. Its upper four bits are the PS to PL fabric resets
//! `pl_resetn0` to `pl_resetn3`.
pub const GPIO_BASE_ADDR: usize = 0xFF0A_0000;

pub const MASK_DATA_5_MSW_ADDR: usize = GPIO_BASE_ADDR + 0x2C;
pub const DIRM_5_ADDR: usize = GPIO_BASE_ADDR + 0x344;

static_assertions::const_assert_eq!(MASK_DATA_5_MSW_ADDR, 0xFF0A_002C);
static_assertions::const_assert_eq!(DIRM_5_ADDR, 0xFF0A_0344);

/// Bit position of `pl_resetn0` inside bank 5.
pub const FABRIC_RESET_FIRST_BIT: u32 = 31;
/// Maximum number of fabric resets.
pub const MAX_FABRIC_RESETS: u32 = 4;

/// Maskable write to the upper 16 bits of bank 5.
///
/// A set mask bit protects the corresponding data bit from being written.
#[bitbybit::bitfield(u32, debug)]
pub struct MaskedData {
    #[bits(16..=31, rw)]
    mask: u16,
    #[bits(0..=15, rw)]
    data: u16,
}
