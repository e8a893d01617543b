//! # Configuration security unit (CSU) registers
//!
//! Only the secure stream switch (SSS) configuration and the PCAP register block are described
//! here.
use arbitrary_int::u4;

pub const CSU_BASE_ADDR: usize = 0xFFCA_0000;

const SSS_CFG_OFFSET: usize = 0x0008;
const PCAP_PROG_OFFSET: usize = 0x3000;
const PCAP_RDWR_OFFSET: usize = 0x3004;
const PCAP_CTRL_OFFSET: usize = 0x3008;
const PCAP_RESET_OFFSET: usize = 0x300C;
const PCAP_STATUS_OFFSET: usize = 0x3010;

/// CSU_SSS_CFG register.
pub const SSS_CFG_ADDR: usize = CSU_BASE_ADDR + SSS_CFG_OFFSET;
/// CSU_PCAP_PROG register.
pub const PCAP_PROG_ADDR: usize = CSU_BASE_ADDR + PCAP_PROG_OFFSET;
/// CSU_PCAP_RDWR register.
pub const PCAP_RDWR_ADDR: usize = CSU_BASE_ADDR + PCAP_RDWR_OFFSET;
/// CSU_PCAP_CTRL register.
pub const PCAP_CTRL_ADDR: usize = CSU_BASE_ADDR + PCAP_CTRL_OFFSET;
/// CSU_PCAP_RESET register.
pub const PCAP_RESET_ADDR: usize = CSU_BASE_ADDR + PCAP_RESET_OFFSET;
/// CSU_PCAP_STATUS register.
pub const PCAP_STATUS_ADDR: usize = CSU_BASE_ADDR + PCAP_STATUS_OFFSET;

static_assertions::const_assert_eq!(SSS_CFG_ADDR, 0xFFCA_0008);
static_assertions::const_assert_eq!(PCAP_PROG_ADDR, 0xFFCA_3000);
static_assertions::const_assert_eq!(PCAP_STATUS_ADDR, 0xFFCA_3010);

pub const SSS_CFG_PCAP_SSS_MASK: u32 = 0x0000_000F;
pub const SSS_CFG_PCAP_SSS_SHIFT: u32 = 0;

pub const PCAP_STATUS_PCAP_WR_IDLE_MASK: u32 = 0x0000_0001;
pub const PCAP_STATUS_PL_INIT_SHIFT: u32 = 2;
pub const PCAP_STATUS_PL_INIT_MASK: u32 = 0x0000_0004;
pub const PCAP_STATUS_PL_DONE_MASK: u32 = 0x0000_0008;

/// SSS source selection which connects the DMA to the PCAP data sink.
pub const SSS_SRC_DMA: u4 = u4::new(0x5);

/// Destination address used in DMA descriptors to indicate that the PCAP is the data sink.
pub const DESTINATION_PCAP_ADDR: u32 = 0xFFFF_FFFF;

#[bitbybit::bitfield(u32, debug)]
pub struct SssConfig {
    /// Data source for the PCAP.
    #[bits(0..=3, rw)]
    pcap_sss: u4,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PcapProg {
    /// Acts as the PROG_B signal of the PL. Active low.
    #[bit(0, rw)]
    pcfg_prog_b: bool,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum PcapDirection {
    Write = 0,
    Read = 1,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PcapReadWrite {
    #[bit(0, rw)]
    pcap_rdwr_b: PcapDirection,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PcapCtrl {
    /// Selects the PCAP instead of the ICAP for PL configuration.
    #[bit(0, rw)]
    pcap_pr: bool,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PcapReset {
    #[bit(0, rw)]
    reset: bool,
}

#[bitbybit::bitfield(u32, debug)]
pub struct PcapStatus {
    /// PL configuration done.
    #[bit(3, r)]
    pl_done: bool,
    /// PL housecleaning done, ready for configuration data.
    #[bit(2, r)]
    pl_init: bool,
    #[bit(1, r)]
    pcap_rd_idle: bool,
    #[bit(0, r)]
    pcap_wr_idle: bool,
}
