//! # ZDMA channel registers
//!
//! The low-power domain DMA (ADMA) has eight identical channels. All register addresses are
//! relative to the channel base address, see [ChannelRegs].
pub const ADMA_CH0_BASE_ADDR: usize = 0xFFA8_0000;
/// Address distance between two ADMA channels.
pub const ADMA_CHANNEL_STRIDE: usize = 0x1_0000;
pub const ADMA_NUM_CHANNELS: usize = 8;

const ISR_OFFSET: usize = 0x100;
const CTRL0_OFFSET: usize = 0x110;
const STATUS_OFFSET: usize = 0x11C;
const SRC_DSCR_WORD0_OFFSET: usize = 0x128;
const DST_DSCR_WORD0_OFFSET: usize = 0x138;
const WR_ONLY_WORD0_OFFSET: usize = 0x148;
const CTRL2_OFFSET: usize = 0x200;

static_assertions::const_assert_eq!(ADMA_CH0_BASE_ADDR + STATUS_OFFSET, 0xFFA8_011C);
static_assertions::const_assert_eq!(ADMA_CH0_BASE_ADDR + SRC_DSCR_WORD0_OFFSET + 3 * 4, 0xFFA8_0134);
static_assertions::const_assert_eq!(ADMA_CH0_BASE_ADDR + DST_DSCR_WORD0_OFFSET + 3 * 4, 0xFFA8_0144);
static_assertions::const_assert_eq!(ADMA_CH0_BASE_ADDR + WR_ONLY_WORD0_OFFSET + 3 * 4, 0xFFA8_0154);

pub const STATUS_STATE_MASK: u32 = 0x0000_0003;
pub const STATUS_STATE_DONE: u32 = 0x0000_0000;
pub const STATUS_STATE_ERR: u32 = 0x0000_0003;

pub const CTRL0_POINT_TYPE_MASK: u32 = 0x0000_0040;
pub const CTRL0_POINT_TYPE_NORMAL: u32 = 0x0000_0000;
pub const CTRL0_MODE_MASK: u32 = 0x0000_0030;
pub const CTRL0_MODE_WR_ONLY: u32 = 0x0000_0010;

pub const DST_DSCR_WORD0_LSB_MASK: u32 = 0xFFFF_FFFF;
pub const DST_DSCR_WORD1_MSB_MASK: u32 = 0x0001_FFFF;

pub const CTRL2_EN_MASK: u32 = 0x0000_0001;
pub const ISR_DMA_DONE_MASK: u32 = 0x0000_0400;
/// All write-one-to-clear bits of the interrupt status register.
pub const ISR_ALL_MASK: u32 = 0x0000_0FFF;

/// Base address of the given ADMA channel. The channel index is not range checked.
#[inline]
pub const fn channel_base_addr(index: usize) -> usize {
    ADMA_CH0_BASE_ADDR + index * ADMA_CHANNEL_STRIDE
}

/// Register addresses of a single ZDMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRegs {
    base: usize,
}

impl ChannelRegs {
    #[inline]
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// ZDMA_CH_ISR. Bits are cleared by writing one.
    #[inline]
    pub const fn isr(&self) -> usize {
        self.base + ISR_OFFSET
    }

    /// ZDMA_CH_CTRL0
    #[inline]
    pub const fn ctrl0(&self) -> usize {
        self.base + CTRL0_OFFSET
    }

    /// ZDMA_CH_STATUS
    #[inline]
    pub const fn status(&self) -> usize {
        self.base + STATUS_OFFSET
    }

    /// ZDMA_CH_SRC_DSCR_WORD0 to ZDMA_CH_SRC_DSCR_WORD3.
    ///
    /// The word index must be smaller than 4.
    #[inline]
    pub const fn src_dscr_word(&self, word: usize) -> usize {
        self.base + SRC_DSCR_WORD0_OFFSET + word * 4
    }

    /// ZDMA_CH_DST_DSCR_WORD0 to ZDMA_CH_DST_DSCR_WORD3.
    ///
    /// The word index must be smaller than 4.
    #[inline]
    pub const fn dst_dscr_word(&self, word: usize) -> usize {
        self.base + DST_DSCR_WORD0_OFFSET + word * 4
    }

    /// ZDMA_CH_WR_ONLY_WORD0 to ZDMA_CH_WR_ONLY_WORD3.
    ///
    /// The word index must be smaller than 4.
    #[inline]
    pub const fn wr_only_word(&self, word: usize) -> usize {
        self.base + WR_ONLY_WORD0_OFFSET + word * 4
    }

    /// ZDMA_CH_CTRL2
    #[inline]
    pub const fn ctrl2(&self) -> usize {
        self.base + CTRL2_OFFSET
    }
}

#[bitbybit::bitfield(u32, debug)]
pub struct InterruptStatus {
    #[bit(11, rw)]
    dma_pause: bool,
    #[bit(10, rw)]
    dma_done: bool,
    #[bit(9, rw)]
    axi_wr_data: bool,
    #[bit(8, rw)]
    axi_rd_data: bool,
    #[bit(7, rw)]
    axi_rd_dst_dscr: bool,
    #[bit(6, rw)]
    axi_rd_src_dscr: bool,
    #[bit(5, rw)]
    dst_acct_err: bool,
    #[bit(4, rw)]
    src_acct_err: bool,
    #[bit(3, rw)]
    byte_cnt_overflow: bool,
    #[bit(2, rw)]
    dst_dscr_done: bool,
    #[bit(1, rw)]
    src_dscr_done: bool,
    #[bit(0, rw)]
    invalid_apb: bool,
}

#[bitbybit::bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum TransferMode {
    Normal = 0b00,
    WriteOnly = 0b01,
    ReadOnly = 0b10,
    Reserved = 0b11,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum PointType {
    /// Descriptors are taken from the descriptor registers.
    Normal = 0,
    /// Descriptors are fetched from memory.
    LinkedList = 1,
}

#[bitbybit::bitfield(u32, debug)]
pub struct ChannelCtrl0 {
    #[bit(6, rw)]
    point_type: PointType,
    #[bits(4..=5, rw)]
    mode: TransferMode,
}

#[bitbybit::bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum ChannelState {
    Done = 0b00,
    Paused = 0b01,
    Busy = 0b10,
    DoneWithError = 0b11,
}

#[bitbybit::bitfield(u32, debug)]
pub struct ChannelStatus {
    #[bits(0..=1, r)]
    state: ChannelState,
}

#[bitbybit::bitfield(u32, debug)]
pub struct ChannelCtrl2 {
    #[bit(0, rw)]
    enable: bool,
}
