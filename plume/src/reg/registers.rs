//! Virtual registers and their allocator

use std::fmt;

/// Virtual register: r0, r1, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VReg(pub u32);

impl VReg {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Hands out fresh virtual registers in increasing order.
///
/// One allocator per compilation unit; numbering is never reset implicitly,
/// so registers stay unique across every expression emitted with it.
#[derive(Debug, Clone, Default)]
pub struct RegAllocator {
    next: u32,
}

impl RegAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next unused register
    pub fn fresh(&mut self) -> VReg {
        let reg = VReg(self.next);
        self.next += 1;
        reg
    }

    /// Number of registers handed out so far
    pub fn allocated(&self) -> u32 {
        self.next
    }

    /// Start numbering from r0 again
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
