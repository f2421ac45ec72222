//! Switch vendor identification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor / model of a managed switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    /// Not detected yet
    #[default]
    Unknown,
    /// Generic IEEE 802.1Q bridge (Dell PowerConnect, Extreme Summit, ...)
    Rfc2674,
    /// Intel Express 530T
    IntelEs530,
    /// Force10 E600/E1200
    Force10E600,
    /// Ether-Raptor ER1010
    RaptorEr1010,
    /// Lambda Optical Spectra
    LambdaOptical,
    /// Description matched no signature
    Illegal,
}

/// How a `sysDescr` string is compared against a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

impl SignatureMatch {
    fn matches(&self, description: &str) -> bool {
        match self {
            SignatureMatch::Exact(s) => description == *s,
            SignatureMatch::Prefix(s) => description.starts_with(s),
        }
    }
}

/// Known `sysDescr` signatures, checked in order
pub const VENDOR_SIGNATURES: &[(SignatureMatch, Vendor)] = &[
    (SignatureMatch::Exact("PowerConnect 5224"), Vendor::Rfc2674),
    (
        SignatureMatch::Exact("Intel(R) Express 530T Switch "),
        Vendor::IntelEs530,
    ),
    (SignatureMatch::Exact("Ethernet Switch"), Vendor::Rfc2674),
    // Dell PowerConnect 6024/6024F
    (SignatureMatch::Exact("Ethernet Routing Switch"), Vendor::Rfc2674),
    (SignatureMatch::Prefix("Summit1i"), Vendor::Rfc2674),
    (SignatureMatch::Prefix("Summit5i"), Vendor::Rfc2674),
    (SignatureMatch::Prefix("Ether-Raptor"), Vendor::RaptorEr1010),
    (SignatureMatch::Prefix("Spectra"), Vendor::LambdaOptical),
    (
        SignatureMatch::Prefix("Force10 Networks Real Time Operating System Software"),
        Vendor::Force10E600,
    ),
];

impl Vendor {
    /// Identify a vendor from the device's `sysDescr`.
    ///
    /// Returns [`Vendor::Illegal`] when no signature matches.
    pub fn from_description(description: &str) -> Vendor {
        VENDOR_SIGNATURES
            .iter()
            .find(|(signature, _)| signature.matches(description))
            .map(|(_, vendor)| *vendor)
            .unwrap_or(Vendor::Illegal)
    }

    /// Returns true if the vendor implements the RFC 2674 static VLAN table
    pub const fn is_rfc2674_compatible(&self) -> bool {
        matches!(
            self,
            Vendor::Rfc2674 | Vendor::IntelEs530 | Vendor::Force10E600 | Vendor::RaptorEr1010
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Unknown => "unknown",
            Vendor::Rfc2674 => "rfc2674",
            Vendor::IntelEs530 => "intel-es530",
            Vendor::Force10E600 => "force10-e600",
            Vendor::RaptorEr1010 => "raptor-er1010",
            Vendor::LambdaOptical => "lambda-optical",
            Vendor::Illegal => "illegal",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "unknown" => Vendor::Unknown,
            "rfc2674" => Vendor::Rfc2674,
            "intel-es530" => Vendor::IntelEs530,
            "force10-e600" => Vendor::Force10E600,
            "raptor-er1010" => Vendor::RaptorEr1010,
            "lambda-optical" => Vendor::LambdaOptical,
            "illegal" => Vendor::Illegal,
            _ => return Err(format!("unknown vendor '{}'", s)),
        })
    }
}

/// Vendor selection when creating a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VendorModel {
    /// Probe the switch's `sysDescr` before choosing a variant
    #[default]
    AutoDetect,
    /// Use the given vendor without probing
    Fixed(Vendor),
}

impl FromStr for VendorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(VendorModel::AutoDetect)
        } else {
            s.parse().map(VendorModel::Fixed)
        }
    }
}

impl fmt::Display for VendorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorModel::AutoDetect => f.write_str("auto"),
            VendorModel::Fixed(vendor) => vendor.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_signatures() {
        assert_eq!(Vendor::from_description("PowerConnect 5224"), Vendor::Rfc2674);
        assert_eq!(Vendor::from_description("Ethernet Switch"), Vendor::Rfc2674);
        assert_eq!(
            Vendor::from_description("Ethernet Routing Switch"),
            Vendor::Rfc2674
        );
        assert_eq!(
            Vendor::from_description("Intel(R) Express 530T Switch "),
            Vendor::IntelEs530
        );
        // Exact matches are exact: no trailing space, no match
        assert_eq!(
            Vendor::from_description("Intel(R) Express 530T Switch"),
            Vendor::Illegal
        );
        assert_eq!(
            Vendor::from_description("Ethernet Switch v2"),
            Vendor::Illegal
        );
    }

    #[test]
    fn test_prefix_signatures() {
        assert_eq!(Vendor::from_description("Summit1i - Version 7.1"), Vendor::Rfc2674);
        assert_eq!(Vendor::from_description("Summit5i"), Vendor::Rfc2674);
        assert_eq!(
            Vendor::from_description("Ether-Raptor ER1010"),
            Vendor::RaptorEr1010
        );
        assert_eq!(
            Vendor::from_description("Spectra LambdaNode"),
            Vendor::LambdaOptical
        );
        assert_eq!(
            Vendor::from_description(
                "Force10 Networks Real Time Operating System Software Version: 6.2"
            ),
            Vendor::Force10E600
        );
    }

    #[test]
    fn test_unmatched_is_illegal() {
        assert_eq!(Vendor::from_description(""), Vendor::Illegal);
        assert_eq!(Vendor::from_description("Acme"), Vendor::Illegal);
    }

    #[test]
    fn test_compatibility() {
        assert!(Vendor::Rfc2674.is_rfc2674_compatible());
        assert!(Vendor::IntelEs530.is_rfc2674_compatible());
        assert!(Vendor::Force10E600.is_rfc2674_compatible());
        assert!(!Vendor::LambdaOptical.is_rfc2674_compatible());
        assert!(!Vendor::Illegal.is_rfc2674_compatible());
        assert!(!Vendor::Unknown.is_rfc2674_compatible());
    }

    #[test]
    fn test_vendor_model_from_str() {
        assert_eq!("auto".parse::<VendorModel>().unwrap(), VendorModel::AutoDetect);
        assert_eq!(
            "force10-e600".parse::<VendorModel>().unwrap(),
            VendorModel::Fixed(Vendor::Force10E600)
        );
        assert!("cisco".parse::<VendorModel>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for vendor in [
            Vendor::Rfc2674,
            Vendor::IntelEs530,
            Vendor::Force10E600,
            Vendor::RaptorEr1010,
            Vendor::LambdaOptical,
        ] {
            assert_eq!(vendor.to_string().parse::<Vendor>().unwrap(), vendor);
        }
    }
}
