//! Adapter model and selection policy.
//!
//! An [`Adapter`] is an immutable snapshot of one Bluetooth controller taken
//! during discovery. [`select_adapter`] picks the controller peared should
//! target when several are present.

use std::fmt;

use serde::Serialize;

use crate::error::{CoreError, Result};

/// A Bluetooth controller exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adapter {
    /// Stable kernel-assigned identifier such as `hci0`.
    pub id: String,
    /// Controller MAC address. Empty when unknown.
    pub address: String,
    /// Human-friendly label. Empty when unknown.
    pub alias: String,
    /// Whether the radio is powered on.
    pub powered: bool,
    /// Best-effort bus classification.
    pub transport: Transport,
}

impl Adapter {
    /// Returns true when `identifier` names this adapter.
    ///
    /// The comparison is case-insensitive and checks the id, address and
    /// alias in that order. A blank identifier never matches.
    #[must_use]
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return false;
        }

        [&self.id, &self.address, &self.alias]
            .into_iter()
            .any(|field| eq_fold(field, identifier))
    }
}

/// The bus an adapter is attached through.
///
/// Values are best effort because sysfs metadata is not always present or
/// consistent across kernels; `Unknown` is a valid result, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// The bus could not be determined.
    #[default]
    Unknown,
    /// Attached over USB.
    Usb,
    /// Attached over PCI or PCIe.
    Pci,
    /// A platform or ACPI enumerated device.
    Platform,
}

impl Transport {
    /// The lowercase name used in output and serialization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Usb => "usb",
            Self::Pci => "pci",
            Self::Platform => "platform",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choose the adapter peared should target.
///
/// 1. A non-blank `preferred` identifier selects the first adapter that
///    [`matches`](Adapter::matches) it.
/// 2. Otherwise the first USB attached adapter wins.
/// 3. Otherwise the first adapter is returned.
///
/// When two adapters match `preferred` on different fields the earlier one in
/// `adapters` wins.
///
/// # Errors
///
/// Returns [`CoreError::NoAdapters`] when `adapters` is empty.
pub fn select_adapter<'a>(preferred: Option<&str>, adapters: &'a [Adapter]) -> Result<&'a Adapter> {
    let first = adapters.first().ok_or(CoreError::NoAdapters)?;

    if let Some(preferred) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(adapter) = adapters.iter().find(|a| a.matches(preferred)) {
            return Ok(adapter);
        }
    }

    Ok(adapters
        .iter()
        .find(|a| a.transport == Transport::Usb)
        .unwrap_or(first))
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(id: &str, address: &str, alias: &str, transport: Transport) -> Adapter {
        Adapter {
            id: id.to_string(),
            address: address.to_string(),
            alias: alias.to_string(),
            powered: false,
            transport,
        }
    }

    fn fleet() -> Vec<Adapter> {
        vec![
            adapter("hci0", "00:11:22:33:44:55", "Laptop", Transport::Pci),
            adapter("hci1", "AA:BB:CC:DD:EE:FF", "Dongle", Transport::Usb),
            adapter("hci2", "66:77:88:99:AA:BB", "Board", Transport::Platform),
        ]
    }

    #[test]
    fn matches_any_field_case_insensitively() {
        let a = adapter("hci0", "AA:BB:CC:DD:EE:FF", "Kitchen Speaker", Transport::Usb);
        assert!(a.matches("HCI0"));
        assert!(a.matches("aa:bb:cc:dd:ee:ff"));
        assert!(a.matches("  kitchen speaker "));
        assert!(!a.matches("hci1"));
        assert!(!a.matches("   "));
    }

    #[test]
    fn preferred_wins_regardless_of_transport() {
        let adapters = fleet();
        assert_eq!(select_adapter(Some("hci2"), &adapters).unwrap().id, "hci2");
        assert_eq!(
            select_adapter(Some("00:11:22:33:44:55"), &adapters).unwrap().id,
            "hci0"
        );
        assert_eq!(select_adapter(Some("board"), &adapters).unwrap().id, "hci2");
    }

    #[test]
    fn unmatched_preference_falls_back_to_usb() {
        let adapters = fleet();
        assert_eq!(select_adapter(Some("hci9"), &adapters).unwrap().id, "hci1");
    }

    #[test]
    fn blank_preference_is_ignored() {
        let adapters = fleet();
        assert_eq!(select_adapter(Some("  "), &adapters).unwrap().id, "hci1");
        assert_eq!(select_adapter(None, &adapters).unwrap().id, "hci1");
    }

    #[test]
    fn first_adapter_without_usb() {
        let adapters = vec![
            adapter("hci3", "", "", Transport::Platform),
            adapter("hci4", "", "", Transport::Pci),
        ];
        assert_eq!(select_adapter(None, &adapters).unwrap().id, "hci3");
    }

    #[test]
    fn first_matching_adapter_wins_across_fields() {
        let adapters = vec![
            adapter("hci0", "", "hci1", Transport::Pci),
            adapter("hci1", "", "", Transport::Usb),
        ];
        assert_eq!(select_adapter(Some("hci1"), &adapters).unwrap().id, "hci0");
    }

    #[test]
    fn empty_set_is_an_error() {
        let result = select_adapter(Some("hci0"), &[]);
        assert!(matches!(result, Err(CoreError::NoAdapters)));
    }

    #[test]
    fn transport_serializes_lowercase() {
        let json = serde_json::to_string(&Transport::Platform).unwrap();
        assert_eq!(json, "\"platform\"");
        assert_eq!(Transport::Usb.to_string(), "usb");
    }
}
