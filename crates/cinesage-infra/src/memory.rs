//! Process resident-memory gauge.
//!
//! Implements the `MemoryGauge` trait from `cinesage-core` by reading
//! `VmRSS` out of `/proc/self/status`. Platforms without procfs report
//! `None`, which the arbitration layer treats as a passing check.

use cinesage_core::encoder::gate::MemoryGauge;

/// Resident-set-size gauge backed by `/proc/self/status`.
pub struct ProcStatusGauge;

impl MemoryGauge for ProcStatusGauge {
    #[cfg(target_os = "linux")]
    fn resident_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }

    #[cfg(not(target_os = "linux"))]
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

/// Extract the `VmRSS` value (reported in kB) from a `/proc/self/status`
/// blob, converted to bytes.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}
