//! Supported network operating systems.
//!
//! Each platform maps to a builtin [`Driver`](crate::driver::Driver) holding
//! the rule tables that shape parsing, negation, ordering, and idempotency
//! for that OS. The legacy (v2) option files referenced platforms by short
//! OS name (`ios`, `nxos`, ...); the mapping functions here keep those files
//! loadable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A network operating system with a builtin driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Arista EOS
    AristaEos,
    /// Cisco IOS / IOS-XE
    CiscoIos,
    /// Cisco NX-OS
    CiscoNxos,
    /// Cisco IOS-XR
    CiscoXr,
    /// Fortinet FortiOS
    FortinetFortios,
    /// Indentation-only parsing with default rules; used when the specific
    /// platform is unimportant or unknown
    Generic,
    /// Juniper Junos (`set`/`delete` statement syntax)
    JuniperJunos,
    /// VyOS
    Vyos,
}

impl Platform {
    /// All supported platforms, in registry order.
    pub const ALL: [Platform; 8] = [
        Platform::AristaEos,
        Platform::CiscoIos,
        Platform::CiscoNxos,
        Platform::CiscoXr,
        Platform::FortinetFortios,
        Platform::Generic,
        Platform::JuniperJunos,
        Platform::Vyos,
    ];

    /// Map a legacy v2 OS name (`ios`, `iosxr`, ...) to a platform.
    ///
    /// Unknown names fall back to [`Platform::Generic`], matching the legacy
    /// loader behavior.
    pub fn from_v2_os(os_name: &str) -> Platform {
        match os_name {
            "ios" | "iosxe" => Platform::CiscoIos,
            "iosxr" => Platform::CiscoXr,
            "nxos" => Platform::CiscoNxos,
            "eos" => Platform::AristaEos,
            "junos" => Platform::JuniperJunos,
            "vyos" => Platform::Vyos,
            "fortios" => Platform::FortinetFortios,
            _ => Platform::Generic,
        }
    }

    /// Map a platform back to its legacy v2 OS name.
    pub fn v2_os(self) -> &'static str {
        match self {
            Platform::CiscoIos => "ios",
            Platform::CiscoXr => "iosxr",
            Platform::CiscoNxos => "nxos",
            Platform::AristaEos => "eos",
            Platform::JuniperJunos => "junos",
            Platform::Vyos => "vyos",
            Platform::FortinetFortios => "fortios",
            Platform::Generic => "generic",
        }
    }

    /// The canonical name used in error messages and serialized forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::AristaEos => "arista_eos",
            Platform::CiscoIos => "cisco_ios",
            Platform::CiscoNxos => "cisco_nxos",
            Platform::CiscoXr => "cisco_xr",
            Platform::FortinetFortios => "fortinet_fortios",
            Platform::Generic => "generic",
            Platform::JuniperJunos => "juniper_junos",
            Platform::Vyos => "vyos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::UnsupportedPlatform(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v2_mapping_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_v2_os(platform.v2_os()), platform);
        }
    }

    #[test]
    fn test_unknown_v2_os_falls_back_to_generic() {
        assert_eq!(Platform::from_v2_os("procurve"), Platform::Generic);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!(Platform::from_str("cisco_ios").is_ok());
        let err = Platform::from_str("hp_comware5").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
    }
}
