//! # PL power domain sequencing through the PMU global registers
//!
//! The PL must be powered up before the PS/PL isolation may be removed. This ordering is
//! encoded in the type system: [remove_isolation] requires the [PlPowered] token which is
//! only returned by [power_up_pl].
use zynqmp::pmu_global::{
    ISO_INT_EN_ADDR, ISO_STATUS_ADDR, ISO_TRIG_ADDR, Isolation, PWRUP_EN_ADDR,
    PWRUP_STATUS_ADDR, PWRUP_TRIG_ADDR, PowerState,
};

use crate::poll::{PollError, poll_until};
use crate::port::RegisterPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("PL power-up not confirmed after {polls} polls")]
pub struct PowerUpError {
    pub polls: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("PL isolation still active after {polls} polls, status {status:?}")]
pub struct IsolationError {
    pub polls: u32,
    pub status: Isolation,
}

/// Proof that the PL power domain was observed powered up.
#[derive(Debug)]
pub struct PlPowered {
    _private: (),
}

#[inline]
pub fn pl_powered(port: &mut impl RegisterPort) -> bool {
    PowerState::new_with_raw_value(port.read_register(PWRUP_STATUS_ADDR)).pl()
}

#[inline]
pub fn isolation_status(port: &mut impl RegisterPort) -> Isolation {
    Isolation::new_with_raw_value(port.read_register(ISO_STATUS_ADDR))
}

/// Power up the PL domain.
///
/// This is a no-op if the PL is already powered. Otherwise, the power-up is requested and
/// the status register is polled at most `max_polls` times.
pub fn power_up_pl(
    port: &mut impl RegisterPort,
    max_polls: u32,
) -> Result<PlPowered, PowerUpError> {
    if pl_powered(port) {
        log::debug!("PL already powered up");
        return Ok(PlPowered { _private: () });
    }
    let pl_mask = PowerState::ZERO.with_pl(true).raw_value();
    port.write_register(PWRUP_EN_ADDR, pl_mask);
    port.write_register(PWRUP_TRIG_ADDR, pl_mask);
    match poll_until(max_polls, || pl_powered(port)) {
        Ok(polls) => {
            log::debug!("PL powered up after {polls} polls");
            Ok(PlPowered { _private: () })
        }
        Err(PollError::Timeout(polls)) => Err(PowerUpError { polls }),
        Err(PollError::Aborted(never)) => match never {},
    }
}

/// Remove the isolation between the PS and the PL.
///
/// This is a no-op if the PL isolation bits are already cleared.
pub fn remove_isolation(
    port: &mut impl RegisterPort,
    _powered: &PlPowered,
    max_polls: u32,
) -> Result<(), IsolationError> {
    if !isolation_status(port).pl_isolated() {
        log::debug!("PL isolation already removed");
        return Ok(());
    }
    port.write_register(ISO_INT_EN_ADDR, Isolation::PL_ALL.raw_value());
    port.write_register(ISO_TRIG_ADDR, Isolation::PL_ALL.raw_value());
    match poll_until(max_polls, || !isolation_status(port).pl_isolated()) {
        Ok(polls) => {
            log::debug!("PL isolation removed after {polls} polls");
            Ok(())
        }
        Err(PollError::Timeout(polls)) => Err(IsolationError {
            polls,
            status: isolation_status(port),
        }),
        Err(PollError::Aborted(never)) => match never {},
    }
}
