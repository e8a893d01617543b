//! # PCAP and secure stream switch control
//!
//! These functions prepare the PCAP for a PL configuration write, generate the PL configuration
//! reset pulse and connect the DMA to the PCAP through the secure stream switch (SSS).
use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;
use zynqmp::crl_apb::{ClockControl, PCAP_CLK_CTRL_ADDR};
use zynqmp::csu::{
    PCAP_CTRL_ADDR, PCAP_PROG_ADDR, PCAP_RDWR_ADDR, PCAP_RESET_ADDR, PCAP_STATUS_ADDR,
    PcapCtrl, PcapDirection, PcapProg, PcapReadWrite, PcapReset, PcapStatus, SSS_CFG_ADDR,
    SSS_SRC_DMA, SssConfig,
};

use crate::poll::{PollError, poll_until};
use crate::port::RegisterPort;

/// Minimum width of the PL configuration reset pulse.
pub const PL_RESET_PERIOD: MicrosDurationU32 = MicrosDurationU32::micros(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("PL init not asserted after {polls} polls")]
pub struct PlInitTimeout {
    pub polls: u32,
}

/// Raw read of the PCAP status register.
#[inline]
pub fn pcap_status_raw(port: &mut impl RegisterPort) -> u32 {
    port.read_register(PCAP_STATUS_ADDR)
}

#[inline]
pub fn pcap_status(port: &mut impl RegisterPort) -> PcapStatus {
    PcapStatus::new_with_raw_value(pcap_status_raw(port))
}

/// Enable the PCAP clock, release the PCAP from reset and select it as the write path for the
/// PL configuration.
///
/// Repeating this is safe.
pub fn prepare_pcap(port: &mut impl RegisterPort) {
    port.modify_register(PCAP_CLK_CTRL_ADDR, |val| {
        ClockControl::new_with_raw_value(val)
            .with_clk_act(true)
            .raw_value()
    });
    port.modify_register(PCAP_RESET_ADDR, |val| {
        PcapReset::new_with_raw_value(val)
            .with_reset(false)
            .raw_value()
    });
    port.write_register(
        PCAP_CTRL_ADDR,
        PcapCtrl::ZERO.with_pcap_pr(true).raw_value(),
    );
    port.write_register(
        PCAP_RDWR_ADDR,
        PcapReadWrite::ZERO
            .with_pcap_rdwr_b(PcapDirection::Write)
            .raw_value(),
    );
}

/// Pulse the PL configuration reset (PROG_B) and wait for the PL to signal that it is ready
/// for configuration data.
///
/// The reset is held for at least `width` before it is released. PL init is polled at most
/// `max_polls` times afterwards. Repeating the pulse is safe and is the expected way to
/// recover from a load that failed before the transfer started.
pub fn pulse_config_reset(
    port: &mut impl RegisterPort,
    delay: &mut impl DelayNs,
    width: MicrosDurationU32,
    max_polls: u32,
) -> Result<u32, PlInitTimeout> {
    port.write_register(
        PCAP_PROG_ADDR,
        PcapProg::ZERO.with_pcfg_prog_b(false).raw_value(),
    );
    delay.delay_us(width.to_micros());
    port.write_register(
        PCAP_PROG_ADDR,
        PcapProg::ZERO.with_pcfg_prog_b(true).raw_value(),
    );
    match poll_until(max_polls, || pcap_status(port).pl_init()) {
        Ok(polls) => {
            log::debug!("PL init asserted after {polls} polls");
            Ok(polls)
        }
        Err(PollError::Timeout(polls)) => Err(PlInitTimeout { polls }),
        Err(PollError::Aborted(never)) => match never {},
    }
}

/// Configure the secure stream switch so the DMA is the data source of the PCAP.
///
/// All other SSS routes are left untouched.
pub fn select_dma_to_pcap_route(port: &mut impl RegisterPort) {
    port.modify_register(SSS_CFG_ADDR, |val| {
        SssConfig::new_with_raw_value(val)
            .with_pcap_sss(SSS_SRC_DMA)
            .raw_value()
    });
}
