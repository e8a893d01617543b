//! # ADMA channel driver
//!
//! Minimal driver for a channel of the low-power domain DMA. It provides the descriptor
//! programming and channel enable primitives required to stream data into the PCAP.
use arbitrary_int::u3;
use zynqmp::crl_apb::{ADMA_CLK_CTRL_ADDR, ClockControl};
use zynqmp::csu::DESTINATION_PCAP_ADDR;
use zynqmp::zdma::{
    ADMA_CHANNEL_STRIDE, ADMA_CH0_BASE_ADDR, ADMA_NUM_CHANNELS, ChannelCtrl0, ChannelCtrl2,
    ChannelRegs, ChannelState, ChannelStatus, DST_DSCR_WORD1_MSB_MASK, ISR_ALL_MASK,
    InterruptStatus, channel_base_addr,
};

pub use zynqmp::zdma::{PointType, TransferMode};

use crate::port::RegisterPort;

/// ADMA channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u3);

impl Channel {
    #[inline]
    pub const fn new(index: u3) -> Self {
        Self(index)
    }

    /// Look up the channel for the given channel base address.
    pub fn from_base_addr(addr: usize) -> Option<Self> {
        let offset = addr.checked_sub(ADMA_CH0_BASE_ADDR)?;
        if offset % ADMA_CHANNEL_STRIDE != 0 {
            return None;
        }
        let index = offset / ADMA_CHANNEL_STRIDE;
        if index >= ADMA_NUM_CHANNELS {
            return None;
        }
        Some(Self(u3::new(index as u8)))
    }

    #[inline]
    pub fn index(&self) -> u3 {
        self.0
    }

    #[inline]
    pub fn base_addr(&self) -> usize {
        channel_base_addr(self.0.value() as usize)
    }

    #[inline]
    pub fn regs(&self) -> ChannelRegs {
        ChannelRegs::new(self.base_addr())
    }
}

/// Data sink of a DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The PCAP data sink. Encoded with the reserved [DESTINATION_PCAP_ADDR] sentinel.
    Pcap,
    /// A memory address. The upper word is limited to 17 bits.
    Memory { addr_high: u32, addr_low: u32 },
}

impl Destination {
    /// Destination descriptor words 0 and 1.
    pub const fn words(&self) -> [u32; 2] {
        match self {
            Destination::Pcap => [DESTINATION_PCAP_ADDR, 0],
            Destination::Memory {
                addr_high,
                addr_low,
            } => [*addr_low, *addr_high & DST_DSCR_WORD1_MSB_MASK],
        }
    }
}

/// Hardware descriptor of a single DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaDescriptor {
    /// Source address LSB, source address MSB, size in words and the descriptor control word.
    pub source_words: [u32; 4],
    pub destination: Destination,
    pub size_in_words: u32,
    pub mode: TransferMode,
    pub point_type: PointType,
}

impl DmaDescriptor {
    /// Descriptor for streaming `size_in_words` words from memory into the PCAP.
    pub const fn memory_to_pcap(addr_high: u32, addr_low: u32, size_in_words: u32) -> Self {
        Self {
            source_words: [
                addr_low,
                addr_high & DST_DSCR_WORD1_MSB_MASK,
                size_in_words,
                0,
            ],
            destination: Destination::Pcap,
            size_in_words,
            mode: TransferMode::WriteOnly,
            point_type: PointType::Normal,
        }
    }

    #[inline]
    pub const fn targets_pcap(&self) -> bool {
        matches!(self.destination, Destination::Pcap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DmaInitError {
    #[error("DMA channel {0} is busy")]
    ChannelBusy(u3),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("DMA engine was not initialized")]
pub struct DmaNotInitialized;

/// Handle for a single ADMA channel.
///
/// The engine must be initialized with [Self::init] before transfers can be started.
#[derive(Debug)]
pub struct DmaEngine {
    channel: Channel,
    ready: bool,
}

impl DmaEngine {
    /// Create an uninitialized engine for the given channel.
    #[inline]
    pub const fn new(channel: Channel) -> Self {
        Self {
            channel,
            ready: false,
        }
    }

    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Initialize the channel.
    ///
    /// Enables the ADMA clock, disables the channel and clears all pending interrupts. A busy
    /// channel is not touched, because a transfer which was already started can not be
    /// cancelled.
    pub fn init(&mut self, port: &mut impl RegisterPort) -> Result<(), DmaInitError> {
        port.modify_register(ADMA_CLK_CTRL_ADDR, |val| {
            ClockControl::new_with_raw_value(val)
                .with_clk_act(true)
                .raw_value()
        });
        let regs = self.channel.regs();
        if self.status(port).state() == ChannelState::Busy {
            self.ready = false;
            return Err(DmaInitError::ChannelBusy(self.channel.index()));
        }
        port.write_register(regs.ctrl2(), ChannelCtrl2::ZERO.raw_value());
        port.write_register(regs.isr(), ISR_ALL_MASK);
        self.ready = true;
        log::debug!("ADMA channel {} initialized", self.channel.index());
        Ok(())
    }

    /// Program the channel with the given descriptor. Does not start the transfer.
    pub fn program(
        &mut self,
        port: &mut impl RegisterPort,
        descriptor: &DmaDescriptor,
    ) -> Result<(), DmaNotInitialized> {
        if !self.ready {
            return Err(DmaNotInitialized);
        }
        let regs = self.channel.regs();
        port.modify_register(regs.ctrl0(), |val| {
            ChannelCtrl0::new_with_raw_value(val)
                .with_mode(descriptor.mode)
                .with_point_type(descriptor.point_type)
                .raw_value()
        });
        for (word, value) in descriptor.source_words.iter().enumerate() {
            port.write_register(regs.src_dscr_word(word), *value);
        }
        if let Destination::Memory { .. } = descriptor.destination {
            let [lsb, msb] = descriptor.destination.words();
            port.write_register(regs.dst_dscr_word(0), lsb);
            port.write_register(regs.dst_dscr_word(1), msb);
            port.write_register(regs.dst_dscr_word(2), descriptor.size_in_words);
            port.write_register(regs.dst_dscr_word(3), 0);
        }
        Ok(())
    }

    /// Start the programmed transfer by setting the channel enable bit.
    pub fn enable(&mut self, port: &mut impl RegisterPort) -> Result<(), DmaNotInitialized> {
        if !self.ready {
            return Err(DmaNotInitialized);
        }
        port.modify_register(self.channel.regs().ctrl2(), |val| {
            ChannelCtrl2::new_with_raw_value(val)
                .with_enable(true)
                .raw_value()
        });
        Ok(())
    }

    #[inline]
    pub fn status(&self, port: &mut impl RegisterPort) -> ChannelStatus {
        ChannelStatus::new_with_raw_value(port.read_register(self.channel.regs().status()))
    }

    #[inline]
    pub fn interrupt_status(&self, port: &mut impl RegisterPort) -> InterruptStatus {
        InterruptStatus::new_with_raw_value(port.read_register(self.channel.regs().isr()))
    }

    /// Clear the given interrupts. The interrupt status register is write-one-to-clear.
    #[inline]
    pub fn clear_interrupts(&mut self, port: &mut impl RegisterPort, isr: InterruptStatus) {
        port.write_register(self.channel.regs().isr(), isr.raw_value());
    }
}
