//! Trusted application identity resolution.
//!
//! The TEE transport addresses a trusted component by a fixed 16-byte
//! structured identity. Hosts refer to the same component by a file-system
//! style path: the canonical grouped-hex spelling of the identity,
//! optionally carrying the conventional `.ta` image extension. This module
//! converts between the two; resolution is pure, deterministic for
//! well-formed input, and fails closed for everything else.

use crate::error::{HostError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File extension conventionally carried by trusted application images.
pub const TA_EXTENSION: &str = ".ta";

/// Length of the canonical grouped-hex spelling (8-4-4-4-12 plus separators).
const CANONICAL_LEN: usize = 36;

/// Number of hyphen-separated groups in the canonical spelling.
const GROUP_COUNT: usize = 5;

/// 16-byte structured identity of a trusted component.
///
/// The trailing array holds the 6 node bytes first, followed by the 2
/// clock-sequence bytes, each group big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaUuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq_and_node: [u8; 8],
}

impl TaUuid {
    /// Resolve a trusted-application path into its binary identity.
    ///
    /// Strips one `.ta` suffix if present; the remainder must be the
    /// canonical 36-character grouped-hex spelling.
    pub fn from_path(path: &str) -> Result<Self> {
        let canonical = path.strip_suffix(TA_EXTENSION).unwrap_or(path);
        Self::parse_canonical(canonical)
    }

    /// Parse the canonical 8-4-4-4-12 grouped-hex spelling.
    pub fn parse_canonical(s: &str) -> Result<Self> {
        let malformed = || HostError::MalformedIdentifier(s.to_string());

        if s.len() != CANONICAL_LEN {
            return Err(malformed());
        }

        let mut groups = [0u64; GROUP_COUNT];
        let mut count = 0;
        for token in s.split('-') {
            if count == GROUP_COUNT {
                return Err(malformed());
            }
            groups[count] = u64::from_str_radix(token, 16).map_err(|_| malformed())?;
            count += 1;
        }
        if count != GROUP_COUNT {
            return Err(malformed());
        }

        // The final 12-digit group decomposes into the 6 leading node bytes;
        // the fourth group supplies the 2 trailing clock-sequence bytes.
        let mut tail = [0u8; 8];
        tail[..6].copy_from_slice(&groups[4].to_be_bytes()[2..]);
        tail[6..].copy_from_slice(&(groups[3] as u16).to_be_bytes());

        Ok(Self {
            time_low: groups[0] as u32,
            time_mid: groups[1] as u16,
            time_hi_and_version: groups[2] as u16,
            clock_seq_and_node: tail,
        })
    }

    /// Big-endian 16-byte packing of the identity.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..4].copy_from_slice(&self.time_low.to_be_bytes());
        out[4..6].copy_from_slice(&self.time_mid.to_be_bytes());
        out[6..8].copy_from_slice(&self.time_hi_and_version.to_be_bytes());
        out[8..].copy_from_slice(&self.clock_seq_and_node);
        out
    }

    /// Inverse of [`TaUuid::to_bytes`].
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&bytes[8..]);
        Self {
            time_low: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            time_mid: u16::from_be_bytes([bytes[4], bytes[5]]),
            time_hi_and_version: u16::from_be_bytes([bytes[6], bytes[7]]),
            clock_seq_and_node: tail,
        }
    }

    /// View the identity as an RFC-4122 [`uuid::Uuid`].
    ///
    /// The trailing array is reordered to the RFC layout (clock sequence
    /// before node); the canonical spellings of both views are identical.
    pub fn to_uuid(&self) -> uuid::Uuid {
        let t = &self.clock_seq_and_node;
        let d4 = [t[6], t[7], t[0], t[1], t[2], t[3], t[4], t[5]];
        uuid::Uuid::from_fields(self.time_low, self.time_mid, self.time_hi_and_version, &d4)
    }

    /// Build an identity from an RFC-4122 [`uuid::Uuid`].
    pub fn from_uuid(u: &uuid::Uuid) -> Self {
        let (d1, d2, d3, d4) = u.as_fields();
        Self {
            time_low: d1,
            time_mid: d2,
            time_hi_and_version: d3,
            clock_seq_and_node: [d4[2], d4[3], d4[4], d4[5], d4[6], d4[7], d4[0], d4[1]],
        }
    }
}

impl fmt::Display for TaUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.clock_seq_and_node;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{}",
            self.time_low,
            self.time_mid,
            self.time_hi_and_version,
            t[6],
            t[7],
            hex::encode(&t[..6]),
        )
    }
}

impl FromStr for TaUuid {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "12345678-1234-1234-1234-123456789abc";

    #[test]
    fn test_resolve_sample_path() {
        let uuid = TaUuid::from_path(SAMPLE).unwrap();
        assert_eq!(uuid.time_low, 0x1234_5678);
        assert_eq!(uuid.time_mid, 0x1234);
        assert_eq!(uuid.time_hi_and_version, 0x1234);
        assert_eq!(
            uuid.clock_seq_and_node,
            [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0x12, 0x34]
        );
    }

    #[test]
    fn test_ta_extension_stripped() {
        let with_ext = TaUuid::from_path("12345678-1234-1234-1234-123456789abc.ta").unwrap();
        let without = TaUuid::from_path(SAMPLE).unwrap();
        assert_eq!(with_ext, without);
    }

    #[test]
    fn test_distinct_groups_land_in_distinct_fields() {
        let uuid = TaUuid::from_path("00112233-4455-6677-8899-aabbccddeeff.ta").unwrap();
        assert_eq!(uuid.time_low, 0x0011_2233);
        assert_eq!(uuid.time_mid, 0x4455);
        assert_eq!(uuid.time_hi_and_version, 0x6677);
        assert_eq!(
            uuid.clock_seq_and_node,
            [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x88, 0x99]
        );
    }

    #[test]
    fn test_display_round_trip() {
        let uuid = TaUuid::from_path("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let rendered = uuid.to_string();
        assert_eq!(rendered, "00112233-4455-6677-8899-aabbccddeeff");
        assert_eq!(TaUuid::parse_canonical(&rendered).unwrap(), uuid);
    }

    #[test]
    fn test_wrong_length_rejected() {
        for bad in [
            "",
            "1234",
            "12345678-1234-1234-1234-123456789ab",   // 35 chars
            "12345678-1234-1234-1234-123456789abcd", // 37 chars
        ] {
            let err = TaUuid::from_path(bad).unwrap_err();
            assert!(matches!(err, HostError::MalformedIdentifier(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_wrong_group_count_rejected() {
        // 36 characters, but split on '-' yields the wrong number of groups.
        let too_few = "1234567812345-1234-1234-123456789abc";
        let too_many = "12345678-1234-1234-1234-1234-6789abc";
        for bad in [too_few, too_many] {
            assert_eq!(bad.len(), 36);
            let err = TaUuid::from_path(bad).unwrap_err();
            assert!(matches!(err, HostError::MalformedIdentifier(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_non_hex_group_rejected() {
        let err = TaUuid::from_path("1234567z-1234-1234-1234-123456789abc").unwrap_err();
        assert!(matches!(err, HostError::MalformedIdentifier(_)));
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = TaUuid::from_path("12345678-1234-1234-1234--23456789abc").unwrap_err();
        assert!(matches!(err, HostError::MalformedIdentifier(_)));
    }

    #[test]
    fn test_bytes_round_trip() {
        let uuid = TaUuid::from_path(SAMPLE).unwrap();
        assert_eq!(TaUuid::from_bytes(uuid.to_bytes()), uuid);
        assert_eq!(
            uuid.to_bytes(),
            [
                0x12, 0x34, 0x56, 0x78, 0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78, 0x9a,
                0xbc, 0x12, 0x34
            ]
        );
    }

    #[test]
    fn test_rfc_uuid_interop() {
        let uuid = TaUuid::from_path("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let rfc = uuid.to_uuid();
        // Both views spell identically in canonical form.
        assert_eq!(rfc.to_string(), uuid.to_string());
        assert_eq!(TaUuid::from_uuid(&rfc), uuid);
    }

    #[test]
    fn test_from_str() {
        let uuid: TaUuid = SAMPLE.parse().unwrap();
        assert_eq!(uuid.time_low, 0x1234_5678);
        assert!("not-a-uuid".parse::<TaUuid>().is_err());
    }
}
