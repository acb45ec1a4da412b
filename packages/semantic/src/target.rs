//! Target descriptor (C2).
//!
//! Immutable value object queried by the declaration instantiator for
//! pointer size, platform integer size, and struct alignment. Exposes only
//! accessors, per §4.1; obtained once via [`TargetDescriptor::host()`] or an
//! explicit triple.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    sizeof_ptr: u32,
    sizeof_usize: u32,
    sizeof_isize: u32,
    alignof_struct: u32,
}

impl TargetDescriptor {
    pub const fn new(sizeof_ptr: u32, sizeof_usize: u32, sizeof_isize: u32, alignof_struct: u32) -> Self {
        TargetDescriptor { sizeof_ptr, sizeof_usize, sizeof_isize, alignof_struct }
    }

    /// The host platform's descriptor (64-bit, 16-byte max struct alignment).
    pub const fn host() -> Self {
        TargetDescriptor::new(8, 8, 8, 16)
    }

    /// Parse a subset of target triples (`<arch>-<vendor>-<os>`) well enough
    /// to distinguish 32-bit from 64-bit pointer-width targets. Unknown
    /// triples fall back to the host descriptor.
    pub fn from_triple(triple: &str) -> Self {
        let arch = triple.split('-').next().unwrap_or("");
        match arch {
            "i386" | "i686" | "arm" | "wasm32" => TargetDescriptor::new(4, 4, 4, 8),
            _ => TargetDescriptor::host(),
        }
    }

    pub fn sizeof_ptr(&self) -> u32 {
        self.sizeof_ptr
    }

    pub fn sizeof_usize(&self) -> u32 {
        self.sizeof_usize
    }

    pub fn sizeof_isize(&self) -> u32 {
        self.sizeof_isize
    }

    pub fn alignof_struct(&self) -> u32 {
        self.alignof_struct
    }

    /// Size and alignment (they coincide for every built-in) of a built-in
    /// scalar type, in bytes.
    pub fn sizeof_builtin(&self, size_bits: u32, floating: bool) -> u32 {
        if floating {
            debug_assert!(size_bits == 32 || size_bits == 64);
        }
        (size_bits / 8).max(1)
    }

    pub fn alignof_builtin(&self, size_bits: u32, floating: bool) -> u32 {
        self.sizeof_builtin(size_bits, floating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_target_is_64_bit() {
        let t = TargetDescriptor::host();
        assert_eq!(t.sizeof_ptr(), 8);
        assert_eq!(t.sizeof_usize(), 8);
    }

    #[test]
    fn known_32_bit_triple_narrows_pointer_width() {
        let t = TargetDescriptor::from_triple("wasm32-unknown-unknown");
        assert_eq!(t.sizeof_ptr(), 4);
    }

    #[test]
    fn unknown_triple_falls_back_to_host() {
        let t = TargetDescriptor::from_triple("totally-made-up");
        assert_eq!(t, TargetDescriptor::host());
    }

    #[test]
    fn builtin_sizes_match_bit_width() {
        let t = TargetDescriptor::host();
        assert_eq!(t.sizeof_builtin(32, false), 4);
        assert_eq!(t.sizeof_builtin(64, true), 8);
    }
}
