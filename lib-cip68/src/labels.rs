//! CIP-67 Asset Name Labels
//!
//! A label is a 4-byte asset-name prefix: `0000 ++ n(16 bits) ++ crc8(n) ++ 0000`
//! in nibbles, where the checksum is CRC-8 (poly 0x07, init 0) over the two
//! big-endian bytes of `n`.

use lib_types::{AssetName, PolicyId, Unit};

use crate::errors::Cip68Result;

/// Reference token (holds the datum)
pub const REFERENCE_TOKEN_LABEL: u16 = 100;
/// Rich-fungible user token (the tiered user tokens)
pub const RFT_LABEL: u16 = 444;

/// Length of a label prefix in bytes
pub const LABEL_LEN: usize = 4;

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Encode a label number into its 4-byte prefix
pub fn to_label(label: u16) -> [u8; LABEL_LEN] {
    let checksum = crc8(&label.to_be_bytes());
    let n = label as u32;
    let c = checksum as u32;
    // nibbles: 0 | n15..n12 n11..n8 | n7..n4 n3..n0 | c7..c4 c3..c0 | 0
    let packed: u32 = (n << 12) | (c << 4);
    packed.to_be_bytes()
}

/// Decode a 4-byte prefix back into its label number
pub fn from_label(prefix: &[u8]) -> Option<u16> {
    if prefix.len() < LABEL_LEN {
        return None;
    }
    let packed = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if packed >> 28 != 0 || packed & 0x0f != 0 {
        return None;
    }
    let label = ((packed >> 12) & 0xffff) as u16;
    let checksum = ((packed >> 4) & 0xff) as u8;
    if crc8(&label.to_be_bytes()) != checksum {
        return None;
    }
    Some(label)
}

/// `label ++ name` as an asset name
pub fn labeled_asset_name(label: u16, name: &[u8]) -> Cip68Result<AssetName> {
    let mut bytes = Vec::with_capacity(LABEL_LEN + name.len());
    bytes.extend_from_slice(&to_label(label));
    bytes.extend_from_slice(name);
    Ok(AssetName::new(bytes)?)
}

/// `policy ++ label ++ name` as a unit
pub fn labeled_unit(policy_id: PolicyId, label: u16, name: &[u8]) -> Cip68Result<Unit> {
    Ok(Unit::new(policy_id, labeled_asset_name(label, name)?))
}

/// Split an asset name into its label and the remaining name
pub fn split_label(asset_name: &AssetName) -> Option<(u16, &[u8])> {
    let bytes = asset_name.as_bytes();
    let label = from_label(bytes)?;
    Some((label, &bytes[LABEL_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(hex::encode(to_label(REFERENCE_TOKEN_LABEL)), "000643b0");
        assert_eq!(hex::encode(to_label(RFT_LABEL)), "001bc280");
    }

    #[test]
    fn test_labeled_asset_name() {
        let name = labeled_asset_name(REFERENCE_TOKEN_LABEL, b"BushWifPlanesTier1").unwrap();
        assert_eq!(
            name.to_hex(),
            format!("000643b0{}", hex::encode("BushWifPlanesTier1"))
        );
        assert_eq!(split_label(&name).unwrap().1, b"BushWifPlanesTier1");
    }

    #[test]
    fn test_name_too_long_with_label() {
        // 4 label bytes + 29 name bytes exceeds the 32 byte limit
        assert!(labeled_asset_name(RFT_LABEL, &[b'a'; 29]).is_err());
        assert!(labeled_asset_name(RFT_LABEL, &[b'a'; 28]).is_ok());
    }

    #[test]
    fn test_other_label_decodes() {
        // 333, the fungible user token label
        assert_eq!(from_label(&hex::decode("0014df10").unwrap()), Some(333));
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let mut prefix = to_label(RFT_LABEL);
        prefix[2] ^= 0x10;
        assert_eq!(from_label(&prefix), None);
    }

    proptest! {
        #[test]
        fn prop_label_roundtrip(label in any::<u16>()) {
            prop_assert_eq!(from_label(&to_label(label)), Some(label));
        }
    }
}
