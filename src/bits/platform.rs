//! Runtime CPU-feature detection for the popcount primitives.
//!
//! The probe runs once per process and is cached in a `OnceLock`; all
//! popcount entry points consult the cached result to pick an implementation.
//! Selection is invisible to callers: every implementation is bit-identical.

/// Supported population count implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopcountImpl {
    /// Hardware-accelerated population count (native platforms only)
    Hardware,
    /// Portable SWAR (SIMD Within A Register) reduction
    Swar,
}

/// Detected CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// x86_64
    X86_64,
    /// 64-bit ARM
    Aarch64,
    /// Anything else; only portable paths are used
    Other,
}

/// Platform capabilities relevant to the popcount primitives
#[derive(Debug, Clone)]
pub struct PlatformCapabilities {
    /// x86_64 POPCNT instruction support
    pub has_popcnt: bool,
    /// x86_64 AVX2 instruction support (bulk word-span counting)
    pub has_avx2: bool,
    /// ARM64 NEON support (mandatory on aarch64)
    pub has_neon: bool,
    /// Detected architecture
    pub architecture: Architecture,
}

impl PlatformCapabilities {
    /// Probe the current CPU
    pub fn detect() -> Self {
        Self {
            has_popcnt: detect_popcnt(),
            has_avx2: detect_avx2(),
            has_neon: cfg!(target_arch = "aarch64"),
            architecture: detect_architecture(),
        }
    }

    /// Best popcount implementation for this platform
    pub fn popcount_impl(&self) -> PopcountImpl {
        if cfg!(feature = "simd") && (self.has_popcnt || self.has_neon) {
            PopcountImpl::Hardware
        } else {
            PopcountImpl::Swar
        }
    }

    /// Whether the bulk word-span path may use the AVX2 kernel
    pub fn use_avx2_span(&self) -> bool {
        cfg!(feature = "simd") && self.has_avx2
    }

    /// Human-readable probe summary for diagnostics
    pub fn summary(&self) -> String {
        format!(
            "Architecture: {:?}, POPCNT: {}, AVX2: {}, NEON: {}",
            self.architecture, self.has_popcnt, self.has_avx2, self.has_neon
        )
    }
}

fn detect_architecture() -> Architecture {
    #[cfg(target_arch = "x86_64")]
    {
        Architecture::X86_64
    }
    #[cfg(target_arch = "aarch64")]
    {
        Architecture::Aarch64
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        Architecture::Other
    }
}

/// Detect x86_64 POPCNT instruction support
#[cfg(target_arch = "x86_64")]
fn detect_popcnt() -> bool {
    unsafe {
        use std::arch::x86_64::__cpuid;

        // POPCNT bit in ECX of CPUID leaf 1
        let cpuid = __cpuid(1);
        (cpuid.ecx & (1 << 23)) != 0
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_popcnt() -> bool {
    false
}

/// Detect x86_64 AVX2 instruction support
#[cfg(target_arch = "x86_64")]
fn detect_avx2() -> bool {
    unsafe {
        use std::arch::x86_64::__cpuid;

        // AVX (leaf 1, ECX bit 28) is a prerequisite for AVX2 (leaf 7, EBX bit 5)
        let cpuid1 = __cpuid(1);
        let has_avx = (cpuid1.ecx & (1 << 28)) != 0;

        let cpuid7 = __cpuid(7);
        let has_avx2 = (cpuid7.ebx & (1 << 5)) != 0;

        has_avx && has_avx2
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_avx2() -> bool {
    false
}

/// Global platform capabilities instance
static PLATFORM_CAPABILITIES: std::sync::OnceLock<PlatformCapabilities> =
    std::sync::OnceLock::new();

/// Get the cached platform capabilities, probing on first use
pub fn capabilities() -> &'static PlatformCapabilities {
    PLATFORM_CAPABILITIES.get_or_init(PlatformCapabilities::detect)
}

/// Best popcount implementation for the current platform
pub fn popcount_impl() -> PopcountImpl {
    capabilities().popcount_impl()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_is_stable() {
        let first = capabilities();
        let second = capabilities();
        assert_eq!(first.architecture, second.architecture);
        assert_eq!(first.has_popcnt, second.has_popcnt);
        assert_eq!(first.has_avx2, second.has_avx2);
    }

    #[test]
    fn test_architecture_gates() {
        let caps = PlatformCapabilities::detect();
        #[cfg(target_arch = "aarch64")]
        assert!(caps.has_neon, "NEON is mandatory on aarch64");
        #[cfg(not(target_arch = "x86_64"))]
        {
            assert!(!caps.has_popcnt);
            assert!(!caps.has_avx2);
        }
        let _ = caps;
    }

    #[test]
    fn test_summary_format() {
        let summary = capabilities().summary();
        assert!(summary.contains("Architecture:"));
        assert!(summary.contains("POPCNT:"));
        assert!(summary.contains("AVX2:"));
    }

    #[cfg(not(feature = "simd"))]
    #[test]
    fn test_portable_build_selects_swar() {
        assert_eq!(popcount_impl(), PopcountImpl::Swar);
    }
}
