//! # PAC subset for the AMD Zynq UltraScale+ MPSoC
//!
//! This crate only describes the register blocks which are required to configure the
//! programmable logic (PL) from the processing system (PS) through the PCAP interface:
//!
//! - [csu]: Secure stream switch and PCAP registers of the configuration security unit.
//! - [pmu_global]: PL power-up and PS/PL isolation requests.
//! - [zdma]: Channel registers of the low-power domain DMA (ADMA).
//! - [crl_apb]: Clock gates for the PCAP and the ADMA.
//! - [gpio]: EMIO bank 5, which carries the PS to PL fabric resets.
//!
//! All addresses are physical addresses and the register layouts are bit-exact. The register
//! contents are modelled with [bitbybit] bitfields, so every documented mask and shift lives in
//! exactly one place.
#![no_std]

pub mod crl_apb;
pub mod csu;
pub mod gpio;
pub mod pmu_global;
pub mod zdma;
