//! # Register port abstraction
//!
//! All register accesses of this crate go through the [RegisterPort] trait. On the target, the
//! [MmioPort] performs volatile accesses to the physical register addresses. The trait can be
//! implemented by a simulated register file for host tests.

/// Minimal register access interface keyed by physical register address.
pub trait RegisterPort {
    fn read_register(&mut self, addr: usize) -> u32;

    fn write_register(&mut self, addr: usize, value: u32);

    /// Read-modify-write of a register.
    #[inline]
    fn modify_register<F: FnOnce(u32) -> u32>(&mut self, addr: usize, f: F) {
        let value = self.read_register(addr);
        self.write_register(addr, f(value));
    }
}

impl<P: RegisterPort + ?Sized> RegisterPort for &mut P {
    #[inline]
    fn read_register(&mut self, addr: usize) -> u32 {
        (**self).read_register(addr)
    }

    #[inline]
    fn write_register(&mut self, addr: usize, value: u32) {
        (**self).write_register(addr, value)
    }
}

/// Register port which accesses the memory-mapped hardware registers directly.
#[derive(Debug)]
pub struct MmioPort {
    _private: (),
}

impl MmioPort {
    /// Create a new MMIO register port.
    ///
    /// # Safety
    ///
    /// This port allows reads and writes to arbitrary physical addresses. The user must ensure
    /// that it is only used with valid register addresses, that the MMU maps these addresses
    /// as device memory and that concurrent accesses to the same registers do not interfere
    /// with each other.
    #[inline]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterPort for MmioPort {
    #[inline]
    fn read_register(&mut self, addr: usize) -> u32 {
        // Safety: The constructor contract guarantees a valid register address.
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write_register(&mut self, addr: usize, value: u32) {
        // Safety: The constructor contract guarantees a valid register address.
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}
