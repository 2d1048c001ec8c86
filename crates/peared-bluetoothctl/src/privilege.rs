//! Effective privilege detection.

use std::fs;

/// Reports the effective user id of the current process.
pub trait PrivilegeProbe: Send + Sync {
    /// The effective uid, or `None` when it cannot be determined.
    fn effective_uid(&self) -> Option<u32>;

    /// True when the process runs as root. An unknown uid counts as
    /// unprivileged.
    fn is_privileged(&self) -> bool {
        self.effective_uid() == Some(0)
    }
}

/// Reads the effective uid from `/proc/self/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusProbe;

impl PrivilegeProbe for ProcStatusProbe {
    fn effective_uid(&self) -> Option<u32> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        parse_effective_uid(&status)
    }
}

/// A probe that always reports the same uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedUid(pub u32);

impl PrivilegeProbe for FixedUid {
    fn effective_uid(&self) -> Option<u32> {
        Some(self.0)
    }
}

/// The `Uid:` line lists real, effective, saved and filesystem uids.
fn parse_effective_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|ids| ids.split_whitespace().nth(1))
        .and_then(|uid| uid.parse().ok())
}
