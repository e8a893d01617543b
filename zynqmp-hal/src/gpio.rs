//! # PS to PL fabric resets
//!
//! The fabric resets `pl_resetn0` to `pl_resetn3` are driven through EMIO bank 5. They are
//! active low.
use arbitrary_int::u3;
use embedded_hal::delay::DelayNs;
use fugit::MicrosDurationU32;
use zynqmp::gpio::{
    DIRM_5_ADDR, FABRIC_RESET_FIRST_BIT, MASK_DATA_5_MSW_ADDR, MAX_FABRIC_RESETS, MaskedData,
};

use crate::port::RegisterPort;

/// Bank 5 bits of the first `count` fabric resets. Counts above 4 are clamped.
pub fn fabric_reset_bits(count: u3) -> u32 {
    let count = (count.value() as u32).min(MAX_FABRIC_RESETS);
    (0..count).fold(0, |bits, reset| {
        bits | (1 << (FABRIC_RESET_FIRST_BIT - reset))
    })
}

/// Assert the first `count` fabric resets for `width`, then release them.
///
/// Other pins of bank 5 are not modified.
pub fn pulse_fabric_resets(
    port: &mut impl RegisterPort,
    delay: &mut impl DelayNs,
    count: u3,
    width: MicrosDurationU32,
) {
    let bits = fabric_reset_bits(count);
    if bits == 0 {
        return;
    }
    port.modify_register(DIRM_5_ADDR, |val| val | bits);
    let msw_bits = (bits >> 16) as u16;
    let masked = MaskedData::ZERO.with_mask(!msw_bits);
    port.write_register(MASK_DATA_5_MSW_ADDR, masked.with_data(0).raw_value());
    delay.delay_us(width.to_micros());
    port.write_register(MASK_DATA_5_MSW_ADDR, masked.with_data(msw_bits).raw_value());
    log::debug!("pulsed {} fabric resets", count.value().min(MAX_FABRIC_RESETS as u8));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::sim::{Event, SimPort};

    #[test]
    fn reset_bits() {
        assert_eq!(fabric_reset_bits(u3::new(0)), 0);
        assert_eq!(fabric_reset_bits(u3::new(1)), 0x8000_0000);
        assert_eq!(fabric_reset_bits(u3::new(4)), 0xF000_0000);
        assert_eq!(fabric_reset_bits(u3::new(7)), 0xF000_0000);
    }

    #[test]
    fn pulse_two_resets() {
        let mut port = SimPort::new();
        let mut delay = port.delay();
        port.preset(DIRM_5_ADDR, 0x0000_0001);
        pulse_fabric_resets(&mut port, &mut delay, u3::new(2), MicrosDurationU32::micros(1));
        assert_eq!(port.value(DIRM_5_ADDR), 0xC000_0001);
        assert_eq!(
            port.events()[2..],
            [
                Event::Write(MASK_DATA_5_MSW_ADDR, 0x3FFF_0000),
                Event::DelayNs(1000),
                Event::Write(MASK_DATA_5_MSW_ADDR, 0x3FFF_C000),
            ]
        );
    }

    #[test]
    fn no_resets_configured() {
        let mut port = SimPort::new();
        let mut delay = port.delay();
        pulse_fabric_resets(&mut port, &mut delay, u3::new(0), MicrosDurationU32::micros(1));
        assert!(port.events().is_empty());
    }
}
