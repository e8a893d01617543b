//! # HAL for PL configuration on the AMD Zynq UltraScale+ MPSoC
//!
//! This crate loads full bitstreams into the programmable logic (PL) through the processor
//! configuration access port (PCAP). It builds on the register definitions of the
//! [zynqmp] PAC.
//!
//! All register accesses go through the [port::RegisterPort] trait. On hardware, the
//! [port::MmioPort] is used. The blocking delays required for the reset pulses are provided
//! by an [embedded_hal::delay::DelayNs] implementation.
//!
//! ## Example
//!
//! ```no_run
//! use zynqmp_hal::pcap::{Config, ErrorCode, PcapLoader};
//! use zynqmp_hal::port::MmioPort;
//! use zynqmp_hal::zdma::{Channel, DmaEngine};
//!
//! fn load(delay: impl embedded_hal::delay::DelayNs, bitstream: &[u32]) -> ErrorCode {
//!     // Safety: Only used for the PL configuration registers.
//!     let mut port = unsafe { MmioPort::new() };
//!     let mut dma = DmaEngine::new(Channel::new(arbitrary_int::u3::new(0)));
//!     if let Err(e) = dma.init(&mut port) {
//!         return e.into();
//!     }
//!     let mut pcap = PcapLoader::new(port, delay, Config::default());
//!     let addr = bitstream.as_ptr() as u64;
//!     pcap.load_bitstream_code(
//!         &mut dma,
//!         (addr >> 32) as u32,
//!         addr as u32,
//!         bitstream.len() as u32,
//!         0,
//!     )
//! }
//! ```
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(test)]
extern crate std;

pub mod csu;
pub mod gpio;
pub mod pcap;
pub mod pmu;
pub mod poll;
pub mod port;
pub mod zdma;

pub use zynqmp as pac;
