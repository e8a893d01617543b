//! # PL bitstream loading through the PCAP
//!
//! The [PcapLoader] runs the full configuration sequence for a full bitstream located in
//! memory:
//!
//! 1. Power up the PL.
//! 2. Remove the PS/PL isolation.
//! 3. Prepare the PCAP and pulse the PL configuration reset, then wait for PL init.
//! 4. Route the DMA to the PCAP through the secure stream switch.
//! 5. Program and start the DMA transfer into the PCAP.
//! 6. Poll for DMA done and PL done.
//!
//! Every step must succeed before the next one starts. The first failure aborts the sequence.
//! All waits are bounded polling loops, and no interrupts are used. The sequence can not be
//! cancelled once the DMA transfer was started.
//!
//! The caller owns the [DmaEngine] and must serialize loads, the hardware only has a single
//! configuration path.
use arbitrary_int::u3;
use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;
use zynqmp::csu::PcapStatus;
use zynqmp::zdma::{ChannelState, ISR_ALL_MASK, InterruptStatus};

use crate::csu::{self, PL_RESET_PERIOD};
use crate::gpio;
use crate::pmu::{self, IsolationError, PowerUpError};
use crate::poll::{PollError, Step, poll_bounded, poll_until};
use crate::port::RegisterPort;
use crate::zdma::{DmaDescriptor, DmaEngine};

/// Poll budget used for PL init, DMA done and PL done.
pub const PL_DONE_POLL_COUNT: u32 = 30_000;

/// Maximum value of the upper source address word.
pub const SOURCE_ADDR_HIGH_MAX: u32 = zynqmp::zdma::DST_DSCR_WORD1_MSB_MASK;

/// Return codes of the load sequence.
///
/// The values are part of the external interface and must not change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0x0,
    DmaInitFailure = 0x1,
    BitstreamLoadFailure = 0x2,
    PlPowerUpFailure = 0x3,
    PlIsolationFailure = 0x4,
    ParameterNull = 0x5,
    /// Reserved.
    StringInvalid = 0x6,
    /// Reserved for authenticated bitstreams.
    RsaDecryptionFailure = 0x7,
    /// Reserved for authenticated bitstreams.
    Sha2HashFailure = 0x8,
    GenericFailure = 0x9,
}

/// Bitstream category.
///
/// Only full bitstreams are supported. The other variants are reserved and are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[repr(u32)]
pub enum LoadFlags {
    Full = 0,
    Partial = 1 << 0,
    Authenticated = 1 << 1,
    Encrypted = 1 << 3,
}

impl LoadFlags {
    #[inline]
    pub const fn is_supported(&self) -> bool {
        matches!(self, LoadFlags::Full)
    }
}

/// Failure of the first failing stage of the load sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("bitstream size is zero")]
    ZeroSize,
    #[error("source address high word {0:#x} exceeds the DMA address range")]
    SourceAddrOutOfRange(u32),
    #[error("unknown load flags {0:#x}")]
    UnknownFlags(u32),
    #[error("unsupported bitstream type {0:?}")]
    UnsupportedMode(LoadFlags),
    #[error("DMA engine not initialized")]
    DmaNotInitialized,
    #[error("PL power-up failed: {0}")]
    PowerUp(#[from] PowerUpError),
    #[error("PL isolation removal failed: {0}")]
    Isolation(#[from] IsolationError),
    #[error("PL init not asserted after {polls} polls")]
    PlInitTimeout { polls: u32 },
    #[error("DMA done not asserted after {polls} polls")]
    DmaTimeout { polls: u32 },
    #[error("DMA channel reported an error")]
    DmaError,
    #[error("PL done not asserted after {polls} polls, PCAP status {status:#010x}")]
    PlDoneTimeout { polls: u32, status: u32 },
}

impl LoadError {
    /// Status code reported for this error.
    ///
    /// A zero size maps to [ErrorCode::ParameterNull]. An unsupported or unknown mode and a
    /// source address which does not fit the 17 bit descriptor field map to
    /// [ErrorCode::GenericFailure].
    pub const fn code(&self) -> ErrorCode {
        match self {
            LoadError::ZeroSize => ErrorCode::ParameterNull,
            LoadError::SourceAddrOutOfRange(_)
            | LoadError::UnknownFlags(_)
            | LoadError::UnsupportedMode(_) => ErrorCode::GenericFailure,
            LoadError::DmaNotInitialized => ErrorCode::DmaInitFailure,
            LoadError::PowerUp(_) => ErrorCode::PlPowerUpFailure,
            LoadError::Isolation(_) => ErrorCode::PlIsolationFailure,
            LoadError::PlInitTimeout { .. }
            | LoadError::DmaTimeout { .. }
            | LoadError::DmaError
            | LoadError::PlDoneTimeout { .. } => ErrorCode::BitstreamLoadFailure,
        }
    }
}

impl From<csu::PlInitTimeout> for LoadError {
    fn from(value: csu::PlInitTimeout) -> Self {
        LoadError::PlInitTimeout { polls: value.polls }
    }
}

impl From<crate::zdma::DmaNotInitialized> for LoadError {
    fn from(_: crate::zdma::DmaNotInitialized) -> Self {
        LoadError::DmaNotInitialized
    }
}

impl From<crate::zdma::DmaInitError> for ErrorCode {
    #[inline]
    fn from(_: crate::zdma::DmaInitError) -> Self {
        ErrorCode::DmaInitFailure
    }
}

impl From<LoadError> for ErrorCode {
    #[inline]
    fn from(value: LoadError) -> Self {
        value.code()
    }
}

impl From<Result<(), LoadError>> for ErrorCode {
    #[inline]
    fn from(value: Result<(), LoadError>) -> Self {
        match value {
            Ok(()) => ErrorCode::Success,
            Err(e) => e.code(),
        }
    }
}

/// Validated description of a bitstream in memory. The destination is always the PCAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstreamDescriptor {
    source_addr_high: u32,
    source_addr_low: u32,
    size_in_words: u32,
    flags: LoadFlags,
}

impl BitstreamDescriptor {
    /// Validate the raw load request.
    pub fn new(
        source_addr_high: u32,
        source_addr_low: u32,
        size_in_words: u32,
        flags: u32,
    ) -> Result<Self, LoadError> {
        if size_in_words == 0 {
            return Err(LoadError::ZeroSize);
        }
        if source_addr_high > SOURCE_ADDR_HIGH_MAX {
            return Err(LoadError::SourceAddrOutOfRange(source_addr_high));
        }
        let flags = LoadFlags::try_from(flags).map_err(|e| LoadError::UnknownFlags(e.number))?;
        if !flags.is_supported() {
            return Err(LoadError::UnsupportedMode(flags));
        }
        Ok(Self {
            source_addr_high,
            source_addr_low,
            size_in_words,
            flags,
        })
    }

    #[inline]
    pub const fn source_addr_high(&self) -> u32 {
        self.source_addr_high
    }

    #[inline]
    pub const fn source_addr_low(&self) -> u32 {
        self.source_addr_low
    }

    #[inline]
    pub const fn size_in_words(&self) -> u32 {
        self.size_in_words
    }

    #[inline]
    pub const fn flags(&self) -> LoadFlags {
        self.flags
    }

    /// DMA descriptor which streams this bitstream into the PCAP.
    #[inline]
    pub const fn dma_descriptor(&self) -> DmaDescriptor {
        DmaDescriptor::memory_to_pcap(
            self.source_addr_high,
            self.source_addr_low,
            self.size_in_words,
        )
    }
}

/// Snapshot of the live status bits relevant for PL configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareStatus {
    pub power_up_asserted: bool,
    pub isolation_cleared: bool,
    pub pl_init_asserted: bool,
    pub pcap_write_idle: bool,
    pub pl_done_asserted: bool,
    pub dma_done_asserted: bool,
}

/// Poll budgets and pulse widths used by [PcapLoader].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Poll budget for the PL power-up.
    pub power_poll_count: u32,
    /// Poll budget for the isolation removal.
    pub isolation_poll_count: u32,
    /// Poll budget for PL init, DMA done and PL done.
    pub pl_done_poll_count: u32,
    /// Minimum width of the PL configuration reset pulse.
    pub reset_pulse_width: MicrosDurationU32,
    /// Number of PS to PL fabric resets which are pulsed after a successful load. Values
    /// above 4 are clamped.
    pub fabric_resets: u3,
    /// Width of the fabric reset pulse.
    pub fabric_reset_width: MicrosDurationU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            power_poll_count: PL_DONE_POLL_COUNT,
            isolation_poll_count: PL_DONE_POLL_COUNT,
            pl_done_poll_count: PL_DONE_POLL_COUNT,
            reset_pulse_width: PL_RESET_PERIOD,
            fabric_resets: u3::new(0),
            fabric_reset_width: PL_RESET_PERIOD,
        }
    }
}

/// PL configuration driver.
pub struct PcapLoader<Port: RegisterPort, Delay: DelayNs> {
    port: Port,
    delay: Delay,
    config: Config,
}

impl<Port: RegisterPort, Delay: DelayNs> PcapLoader<Port, Delay> {
    pub fn new(port: Port, delay: Delay, config: Config) -> Self {
        Self {
            port,
            delay,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn port_mut(&mut self) -> &mut Port {
        &mut self.port
    }

    /// Release the register port and the delay provider.
    pub fn release(self) -> (Port, Delay) {
        (self.port, self.delay)
    }

    /// Raw snapshot of the PCAP status register.
    ///
    /// This is a pure read which can be performed at any time.
    #[inline]
    pub fn pcap_status(&mut self) -> u32 {
        csu::pcap_status_raw(&mut self.port)
    }

    pub fn hardware_status(&mut self, dma: &DmaEngine) -> HardwareStatus {
        let pcap = csu::pcap_status(&mut self.port);
        HardwareStatus {
            power_up_asserted: pmu::pl_powered(&mut self.port),
            isolation_cleared: !pmu::isolation_status(&mut self.port).pl_isolated(),
            pl_init_asserted: pcap.pl_init(),
            pcap_write_idle: pcap.pcap_wr_idle(),
            pl_done_asserted: pcap.pl_done(),
            dma_done_asserted: dma.interrupt_status(&mut self.port).dma_done(),
        }
    }

    /// Load a full bitstream and return the raw [ErrorCode].
    pub fn load_bitstream_code(
        &mut self,
        dma: &mut DmaEngine,
        source_addr_high: u32,
        source_addr_low: u32,
        size_in_words: u32,
        flags: u32,
    ) -> ErrorCode {
        self.load_bitstream(dma, source_addr_high, source_addr_low, size_in_words, flags)
            .into()
    }

    /// Load a full bitstream from memory into the PL.
    ///
    /// The request is validated before any register is accessed. Blocks until the PL signals
    /// that the configuration is done or until a stage fails.
    pub fn load_bitstream(
        &mut self,
        dma: &mut DmaEngine,
        source_addr_high: u32,
        source_addr_low: u32,
        size_in_words: u32,
        flags: u32,
    ) -> Result<(), LoadError> {
        let descriptor =
            BitstreamDescriptor::new(source_addr_high, source_addr_low, size_in_words, flags)
                .inspect_err(|e| log::error!("invalid bitstream load request: {e}"))?;
        if !dma.is_ready() {
            log::error!("bitstream load requested with uninitialized DMA engine");
            return Err(LoadError::DmaNotInitialized);
        }
        self.run_sequence(dma, &descriptor)
            .inspect_err(|e| log::error!("bitstream load failed: {e}"))?;
        log::info!("PL configured with {size_in_words} words");
        Ok(())
    }

    fn run_sequence(
        &mut self,
        dma: &mut DmaEngine,
        descriptor: &BitstreamDescriptor,
    ) -> Result<(), LoadError> {
        let powered = self.power_up_pl()?;
        self.remove_isolation(&powered)?;
        self.pulse_config_reset()?;
        self.select_dma_to_pcap_route();
        self.transfer(dma, descriptor)?;
        self.wait_for_completion(dma)?;
        gpio::pulse_fabric_resets(
            &mut self.port,
            &mut self.delay,
            self.config.fabric_resets,
            self.config.fabric_reset_width,
        );
        Ok(())
    }

    /// See [pmu::power_up_pl].
    #[inline]
    pub fn power_up_pl(&mut self) -> Result<pmu::PlPowered, PowerUpError> {
        pmu::power_up_pl(&mut self.port, self.config.power_poll_count)
    }

    /// See [pmu::remove_isolation].
    #[inline]
    pub fn remove_isolation(&mut self, powered: &pmu::PlPowered) -> Result<(), IsolationError> {
        pmu::remove_isolation(&mut self.port, powered, self.config.isolation_poll_count)
    }

    /// Prepare the PCAP for writing and pulse the PL configuration reset.
    ///
    /// See [csu::prepare_pcap] and [csu::pulse_config_reset].
    pub fn pulse_config_reset(&mut self) -> Result<(), csu::PlInitTimeout> {
        csu::prepare_pcap(&mut self.port);
        csu::pulse_config_reset(
            &mut self.port,
            &mut self.delay,
            self.config.reset_pulse_width,
            self.config.pl_done_poll_count,
        )?;
        Ok(())
    }

    /// See [csu::select_dma_to_pcap_route].
    #[inline]
    pub fn select_dma_to_pcap_route(&mut self) {
        csu::select_dma_to_pcap_route(&mut self.port);
    }

    /// Program the DMA with the bitstream and start the transfer into the PCAP.
    ///
    /// Returns right after the transfer was started, use [Self::wait_for_completion] to wait
    /// for the PL configuration to complete. The descriptor mode was already checked by
    /// [BitstreamDescriptor::new]. Pending channel interrupts are cleared before the start so
    /// that a done flag left over from an earlier transfer is not taken as completion.
    pub fn transfer(
        &mut self,
        dma: &mut DmaEngine,
        descriptor: &BitstreamDescriptor,
    ) -> Result<(), LoadError> {
        if !dma.is_ready() {
            return Err(LoadError::DmaNotInitialized);
        }
        let dma_descr = descriptor.dma_descriptor();
        dma.program(&mut self.port, &dma_descr)?;
        dma.clear_interrupts(
            &mut self.port,
            InterruptStatus::new_with_raw_value(ISR_ALL_MASK),
        );
        dma.enable(&mut self.port)?;
        log::debug!(
            "started DMA transfer of {} words from {:#x}_{:08x}",
            descriptor.size_in_words(),
            descriptor.source_addr_high(),
            descriptor.source_addr_low()
        );
        Ok(())
    }

    /// Wait for the DMA transfer to finish and for the PL to signal configuration done.
    ///
    /// A DMA channel error aborts immediately. Otherwise, both conditions are polled at most
    /// [Config::pl_done_poll_count] times each.
    pub fn wait_for_completion(&mut self, dma: &mut DmaEngine) -> Result<(), LoadError> {
        let port = &mut self.port;
        let dma_result = poll_bounded(self.config.pl_done_poll_count, || {
            if dma.interrupt_status(port).dma_done() {
                return Step::Ready;
            }
            if dma.status(port).state() == ChannelState::DoneWithError {
                return Step::Abort(LoadError::DmaError);
            }
            Step::Pending
        });
        match dma_result {
            Ok(polls) => log::debug!("DMA done after {polls} polls"),
            Err(PollError::Timeout(polls)) => return Err(LoadError::DmaTimeout { polls }),
            Err(PollError::Aborted(e)) => return Err(e),
        }
        let mut last_status = 0;
        let pl_done = poll_until(self.config.pl_done_poll_count, || {
            last_status = csu::pcap_status_raw(port);
            let status = PcapStatus::new_with_raw_value(last_status);
            status.pcap_wr_idle() && status.pl_done()
        });
        match pl_done {
            Ok(polls) => log::debug!("PL done after {polls} polls"),
            Err(PollError::Timeout(polls)) => {
                return Err(LoadError::PlDoneTimeout {
                    polls,
                    status: last_status,
                });
            }
            Err(PollError::Aborted(never)) => match never {},
        }
        dma.clear_interrupts(port, InterruptStatus::ZERO.with_dma_done(true));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::sim::{SimDelay, SimPort};
    use crate::zdma::Channel;
    use zynqmp::crl_apb::PCAP_CLK_CTRL_ADDR;
    use zynqmp::csu::{
        PCAP_PROG_ADDR, PCAP_STATUS_ADDR, PCAP_STATUS_PCAP_WR_IDLE_MASK,
        PCAP_STATUS_PL_DONE_MASK, PCAP_STATUS_PL_INIT_MASK, SSS_CFG_ADDR,
    };
    use zynqmp::gpio::MASK_DATA_5_MSW_ADDR;
    use zynqmp::pmu_global::{
        ISO_INT_EN_ADDR, ISO_PL_MASK, ISO_PL_NON_PCAP_MASK, ISO_STATUS_ADDR, ISO_TRIG_ADDR,
        PWR_PL_MASK, PWRUP_EN_ADDR, PWRUP_STATUS_ADDR, PWRUP_TRIG_ADDR,
    };
    use zynqmp::zdma::{CTRL2_EN_MASK, ChannelRegs, ISR_DMA_DONE_MASK, STATUS_STATE_ERR};

    const PCAP_ALL_DONE: u32 =
        PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK | PCAP_STATUS_PL_DONE_MASK;
    const FULL: u32 = 0;

    fn regs() -> ChannelRegs {
        Channel::new(u3::new(0)).regs()
    }

    fn loader(port: &SimPort) -> PcapLoader<SimPort, SimDelay> {
        PcapLoader::new(port.clone(), port.delay(), Config::default())
    }

    fn init_dma(port: &SimPort) -> DmaEngine {
        port.write_one_to_clear(regs().isr());
        let mut dma = DmaEngine::new(Channel::new(u3::new(0)));
        dma.init(&mut port.clone()).unwrap();
        port.clear_log();
        dma
    }

    /// Every polled status bit is already set. DMA done is raised when the channel is enabled.
    fn preset_hw() -> (SimPort, DmaEngine) {
        let port = SimPort::new();
        let dma = init_dma(&port);
        port.preset(PWRUP_STATUS_ADDR, PWR_PL_MASK);
        port.preset(PCAP_STATUS_ADDR, PCAP_ALL_DONE);
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            regs().isr(),
            ISR_DMA_DONE_MASK,
            0,
        );
        (port, dma)
    }

    fn short_polls(port: &SimPort) -> PcapLoader<SimPort, SimDelay> {
        PcapLoader::new(
            port.clone(),
            port.delay(),
            Config {
                pl_done_poll_count: 20,
                ..Default::default()
            },
        )
    }

    /// Status bits are only set as a reaction to the corresponding register writes.
    fn reactive_hw() -> (SimPort, DmaEngine) {
        let port = SimPort::new();
        let dma = init_dma(&port);
        port.preset(ISO_STATUS_ADDR, ISO_PL_MASK | ISO_PL_NON_PCAP_MASK);
        port.on_write(PWRUP_TRIG_ADDR, PWRUP_STATUS_ADDR, PWR_PL_MASK);
        port.on_write_matching(
            ISO_TRIG_ADDR,
            0,
            0,
            ISO_STATUS_ADDR,
            0,
            ISO_PL_MASK | ISO_PL_NON_PCAP_MASK,
        );
        port.on_write_matching(
            PCAP_PROG_ADDR,
            0,
            0x1,
            PCAP_STATUS_ADDR,
            0,
            PCAP_ALL_DONE,
        );
        port.on_write_matching(
            PCAP_PROG_ADDR,
            0x1,
            0,
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PL_INIT_MASK,
            0,
        );
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            regs().isr(),
            ISR_DMA_DONE_MASK,
            0,
        );
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PCAP_WR_IDLE_MASK | PCAP_STATUS_PL_DONE_MASK,
            0,
        );
        (port, dma)
    }

    fn position_of_write(port: &SimPort, addr: usize) -> usize {
        port.writes()
            .iter()
            .position(|(write_addr, _)| *write_addr == addr)
            .unwrap()
    }

    #[test]
    fn error_code_values() {
        assert_eq!(u32::from(ErrorCode::Success), 0x0);
        assert_eq!(u32::from(ErrorCode::DmaInitFailure), 0x1);
        assert_eq!(u32::from(ErrorCode::BitstreamLoadFailure), 0x2);
        assert_eq!(u32::from(ErrorCode::PlPowerUpFailure), 0x3);
        assert_eq!(u32::from(ErrorCode::PlIsolationFailure), 0x4);
        assert_eq!(u32::from(ErrorCode::ParameterNull), 0x5);
        assert_eq!(u32::from(ErrorCode::StringInvalid), 0x6);
        assert_eq!(u32::from(ErrorCode::RsaDecryptionFailure), 0x7);
        assert_eq!(u32::from(ErrorCode::Sha2HashFailure), 0x8);
        assert_eq!(u32::from(ErrorCode::GenericFailure), 0x9);
        assert_eq!(
            ErrorCode::try_from(0x2u32).ok(),
            Some(ErrorCode::BitstreamLoadFailure)
        );
        assert!(ErrorCode::try_from(0xAu32).is_err());
        assert_eq!(
            ErrorCode::from(crate::zdma::DmaInitError::ChannelBusy(u3::new(2))),
            ErrorCode::DmaInitFailure
        );
    }

    #[test]
    fn descriptor_validation() {
        let descr = BitstreamDescriptor::new(0x1, 0x1000, 16, FULL).unwrap();
        assert_eq!(descr.flags(), LoadFlags::Full);
        assert_eq!(descr.dma_descriptor().source_words, [0x1000, 0x1, 16, 0]);
        assert_eq!(
            BitstreamDescriptor::new(0, 0x1000, 0, FULL),
            Err(LoadError::ZeroSize)
        );
        assert_eq!(
            BitstreamDescriptor::new(0x2_0000, 0x1000, 16, FULL),
            Err(LoadError::SourceAddrOutOfRange(0x2_0000))
        );
        assert_eq!(
            LoadError::SourceAddrOutOfRange(0x2_0000).code(),
            ErrorCode::GenericFailure
        );
        assert_eq!(LoadError::ZeroSize.code(), ErrorCode::ParameterNull);
        assert_eq!(
            BitstreamDescriptor::new(0, 0x1000, 16, 1),
            Err(LoadError::UnsupportedMode(LoadFlags::Partial))
        );
        assert_eq!(
            BitstreamDescriptor::new(0, 0x1000, 16, 0x20),
            Err(LoadError::UnknownFlags(0x20))
        );
    }

    #[test]
    fn load_with_preset_status_bits() {
        for size in [1, 0x100, 0x0013_4F5C, u32::MAX] {
            let (port, mut dma) = preset_hw();
            let mut pcap = loader(&port);
            assert_eq!(
                pcap.load_bitstream_code(&mut dma, 0x0, 0x1000_0000, size, FULL),
                ErrorCode::Success
            );
            assert_eq!(port.value(regs().src_dscr_word(2)), size);
            assert_eq!(port.value(regs().src_dscr_word(0)), 0x1000_0000);
        }
    }

    #[test]
    fn zero_size_is_parameter_null() {
        let (port, mut dma) = preset_hw();
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 0, FULL),
            ErrorCode::ParameterNull
        );
        assert!(port.events().is_empty());
    }

    #[test]
    fn reserved_modes_rejected() {
        for flags in [
            LoadFlags::Partial as u32,
            LoadFlags::Authenticated as u32,
            LoadFlags::Encrypted as u32,
            0x4,
            0xFFFF_FFFF,
        ] {
            let (port, mut dma) = preset_hw();
            let mut pcap = loader(&port);
            let code = pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, flags);
            assert_ne!(code, ErrorCode::Success);
            assert_eq!(code, ErrorCode::GenericFailure);
            assert!(port.writes().is_empty());
        }
    }

    #[test]
    fn uninitialized_dma() {
        let port = SimPort::new();
        let mut dma = DmaEngine::new(Channel::new(u3::new(0)));
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::DmaNotInitialized)
        );
        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
            ErrorCode::DmaInitFailure
        );
        assert!(port.writes().is_empty());
    }

    #[test]
    fn pl_done_timeout_is_bounded() {
        let (port, mut dma) = preset_hw();
        port.preset(
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK,
        );
        port.preset(regs().isr(), ISR_DMA_DONE_MASK);
        let mut pcap = loader(&port);
        let err = pcap.wait_for_completion(&mut dma).unwrap_err();
        assert_eq!(
            err,
            LoadError::PlDoneTimeout {
                polls: PL_DONE_POLL_COUNT,
                status: PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK,
            }
        );
        assert_eq!(port.reads(PCAP_STATUS_ADDR), PL_DONE_POLL_COUNT);
        assert_eq!(err.code(), ErrorCode::BitstreamLoadFailure);

        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
            ErrorCode::BitstreamLoadFailure
        );
    }

    #[test]
    fn dma_error_aborts_immediately() {
        let (port, mut dma) = preset_hw();
        port.preset(regs().isr(), 0);
        port.preset(regs().status(), STATUS_STATE_ERR);
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.wait_for_completion(&mut dma),
            Err(LoadError::DmaError)
        );
        assert_eq!(port.reads(regs().isr()), 1);
        assert_eq!(port.reads(PCAP_STATUS_ADDR), 0);
    }

    #[test]
    fn dma_done_timeout() {
        let (port, mut dma) = preset_hw();
        port.preset(regs().isr(), 0);
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.wait_for_completion(&mut dma),
            Err(LoadError::DmaTimeout {
                polls: PL_DONE_POLL_COUNT
            })
        );
        assert_eq!(port.reads(regs().isr()), PL_DONE_POLL_COUNT);
    }

    #[test]
    fn completion_acknowledges_dma_done() {
        let (port, mut dma) = preset_hw();
        port.preset(regs().isr(), ISR_DMA_DONE_MASK);
        let mut pcap = loader(&port);
        pcap.wait_for_completion(&mut dma).unwrap();
        assert_eq!(port.writes_to(regs().isr()), [ISR_DMA_DONE_MASK]);
        assert!(!dma.interrupt_status(&mut port.clone()).dma_done());
    }

    #[test]
    fn pcap_status_before_load() {
        let port = SimPort::new();
        let mut pcap = loader(&port);
        assert_eq!(pcap.pcap_status(), 0);
        assert!(port.writes().is_empty());
    }

    #[test]
    fn power_up_failure_aborts_sequence() {
        let (port, mut dma) = preset_hw();
        port.preset(PWRUP_STATUS_ADDR, 0);
        let mut pcap = PcapLoader::new(
            port.clone(),
            port.delay(),
            Config {
                power_poll_count: 10,
                ..Default::default()
            },
        );
        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
            ErrorCode::PlPowerUpFailure
        );
        assert_eq!(port.reads(PWRUP_STATUS_ADDR), 11);
        assert!(port.writes_to(ISO_TRIG_ADDR).is_empty());
        assert!(port.writes_to(PCAP_PROG_ADDR).is_empty());
        assert!(port.writes_to(regs().ctrl2()).is_empty());
    }

    #[test]
    fn isolation_failure_aborts_sequence() {
        let (port, mut dma) = preset_hw();
        port.preset(ISO_STATUS_ADDR, ISO_PL_MASK);
        let mut pcap = loader(&port);
        let result = pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL);
        assert!(matches!(result, Err(LoadError::Isolation(_))));
        assert_eq!(ErrorCode::from(result), ErrorCode::PlIsolationFailure);
        assert!(port.writes_to(PCAP_PROG_ADDR).is_empty());
    }

    #[test]
    fn pl_init_timeout_aborts_before_transfer() {
        let (port, mut dma) = preset_hw();
        port.preset(PCAP_STATUS_ADDR, 0);
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::PlInitTimeout {
                polls: PL_DONE_POLL_COUNT
            })
        );
        assert!(port.writes_to(SSS_CFG_ADDR).is_empty());
        assert!(port.writes_to(regs().ctrl2()).is_empty());
    }

    #[test]
    fn cold_sequence_order() {
        let (port, mut dma) = reactive_hw();
        let mut pcap = loader(&port);
        pcap.load_bitstream(&mut dma, 0x0, 0x0800_0000, 0x1000, FULL)
            .unwrap();
        let order = [
            PWRUP_EN_ADDR,
            PWRUP_TRIG_ADDR,
            ISO_INT_EN_ADDR,
            ISO_TRIG_ADDR,
            PCAP_CLK_CTRL_ADDR,
            PCAP_PROG_ADDR,
            SSS_CFG_ADDR,
            regs().src_dscr_word(0),
            regs().isr(),
            regs().ctrl2(),
        ];
        let positions: std::vec::Vec<usize> = order
            .iter()
            .map(|addr| position_of_write(&port, *addr))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(port.value(SSS_CFG_ADDR), 0x5);
        assert_eq!(port.writes_to(regs().ctrl2()).last(), Some(&CTRL2_EN_MASK));
    }

    #[test]
    fn repeated_load_skips_power_and_isolation() {
        let (port, mut dma) = reactive_hw();
        port.preset(PWRUP_STATUS_ADDR, PWR_PL_MASK);
        port.preset(ISO_STATUS_ADDR, 0);
        let mut pcap = loader(&port);
        for _ in 0..2 {
            assert_eq!(
                pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
                ErrorCode::Success
            );
        }
        for addr in [PWRUP_EN_ADDR, PWRUP_TRIG_ADDR, ISO_INT_EN_ADDR, ISO_TRIG_ADDR] {
            assert!(port.writes_to(addr).is_empty());
        }
        assert_eq!(port.writes_to(PCAP_PROG_ADDR), [0, 1, 0, 1]);
    }

    #[test]
    fn transfer_clears_stale_dma_done() {
        let (port, mut dma) = preset_hw();
        port.preset(regs().isr(), ISR_DMA_DONE_MASK);
        let mut pcap = loader(&port);
        let descr = BitstreamDescriptor::new(0, 0x1000, 64, FULL).unwrap();
        pcap.transfer(&mut dma, &descr).unwrap();
        assert_eq!(port.writes_to(regs().isr()), [ISR_ALL_MASK]);
        assert!(
            position_of_write(&port, regs().isr()) < position_of_write(&port, regs().ctrl2())
        );
    }

    #[test]
    fn retry_after_pl_init_timeout() {
        let (port, mut dma) = preset_hw();
        port.preset(PCAP_STATUS_ADDR, 0);
        let mut pcap = short_polls(&port);
        assert_eq!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::PlInitTimeout { polls: 20 })
        );
        assert!(port.writes_to(regs().ctrl2()).is_empty());

        port.preset(PCAP_STATUS_ADDR, PCAP_ALL_DONE);
        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
            ErrorCode::Success
        );
        assert_eq!(port.writes_to(PCAP_PROG_ADDR), [0, 1, 0, 1]);
    }

    #[test]
    fn retry_after_pl_done_timeout() {
        let (port, mut dma) = preset_hw();
        port.preset(
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK,
        );
        let mut pcap = short_polls(&port);
        assert!(matches!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::PlDoneTimeout { polls: 20, .. })
        ));
        assert!(dma.interrupt_status(&mut port.clone()).dma_done());

        port.preset(PCAP_STATUS_ADDR, PCAP_ALL_DONE);
        assert_eq!(
            pcap.load_bitstream_code(&mut dma, 0, 0x1000, 64, FULL),
            ErrorCode::Success
        );
        assert!(!dma.interrupt_status(&mut port.clone()).dma_done());
    }

    #[test]
    fn retry_reports_dma_error_of_new_transfer() {
        let (port, mut dma) = preset_hw();
        port.preset(
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK,
        );
        let mut pcap = short_polls(&port);
        assert!(matches!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::PlDoneTimeout { .. })
        ));

        // The channel fails the next transfer without raising done.
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            regs().status(),
            STATUS_STATE_ERR,
            0,
        );
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            regs().isr(),
            0,
            ISR_DMA_DONE_MASK,
        );
        port.clear_log();
        assert_eq!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::DmaError)
        );
        assert_eq!(port.reads(regs().isr()), 1);
        assert_eq!(port.reads(PCAP_STATUS_ADDR), 0);
    }

    #[test]
    fn stale_dma_done_is_not_completion() {
        let (port, mut dma) = preset_hw();
        port.preset(
            PCAP_STATUS_ADDR,
            PCAP_STATUS_PL_INIT_MASK | PCAP_STATUS_PCAP_WR_IDLE_MASK,
        );
        let mut pcap = short_polls(&port);
        assert!(pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL).is_err());

        // The next transfer never finishes.
        port.on_write_matching(
            regs().ctrl2(),
            CTRL2_EN_MASK,
            0,
            regs().isr(),
            0,
            ISR_DMA_DONE_MASK,
        );
        port.preset(PCAP_STATUS_ADDR, PCAP_ALL_DONE);
        assert_eq!(
            pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL),
            Err(LoadError::DmaTimeout { polls: 20 })
        );
    }

    #[test]
    fn hardware_status_snapshot() {
        let (port, dma) = preset_hw();
        port.preset(regs().isr(), ISR_DMA_DONE_MASK);
        let mut pcap = loader(&port);
        assert_eq!(
            pcap.hardware_status(&dma),
            HardwareStatus {
                power_up_asserted: true,
                isolation_cleared: true,
                pl_init_asserted: true,
                pcap_write_idle: true,
                pl_done_asserted: true,
                dma_done_asserted: true,
            }
        );
        port.preset(ISO_STATUS_ADDR, ISO_PL_NON_PCAP_MASK);
        port.preset(PCAP_STATUS_ADDR, 0);
        let status = pcap.hardware_status(&dma);
        assert!(!status.isolation_cleared);
        assert!(!status.pl_done_asserted);
        assert!(!status.pl_init_asserted);
    }

    #[test]
    fn fabric_resets_after_load() {
        let (port, mut dma) = preset_hw();
        let mut pcap = PcapLoader::new(
            port.clone(),
            port.delay(),
            Config {
                fabric_resets: u3::new(1),
                ..Default::default()
            },
        );
        pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL).unwrap();
        assert_eq!(
            port.writes_to(MASK_DATA_5_MSW_ADDR),
            [0x7FFF_0000, 0x7FFF_8000]
        );
        assert!(
            position_of_write(&port, regs().ctrl2()) < position_of_write(&port, MASK_DATA_5_MSW_ADDR)
        );
    }

    #[test]
    fn no_fabric_resets_by_default() {
        let (port, mut dma) = preset_hw();
        let mut pcap = loader(&port);
        pcap.load_bitstream(&mut dma, 0, 0x1000, 64, FULL).unwrap();
        assert!(port.writes_to(MASK_DATA_5_MSW_ADDR).is_empty());
    }
}
