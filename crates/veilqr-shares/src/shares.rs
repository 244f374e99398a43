//! Share text encoding
//!
//! Shares are opaque bytes to whatever stores them. For collaborators that
//! want text (clipboard, QR payloads, JSON fields) a share is written as
//! `<index>:<lowercase hex>`.

use crate::xor::Share;
use crate::ShareError;

/// Export a share as `"<index>:<hex>"`.
pub fn export_share_hex(share: &Share) -> String {
    format!("{}:{}", share.index, hex::encode(&share.data))
}

/// Parse a share exported by [`export_share_hex`].
pub fn parse_share_hex(input: &str) -> Result<Share, ShareError> {
    let trimmed = input.trim();
    let (index, data) = trimmed
        .split_once(':')
        .ok_or_else(|| ShareError::InvalidShare("missing ':' separator".into()))?;

    let index: u8 = index
        .parse()
        .map_err(|_| ShareError::InvalidShare(format!("bad index '{}'", index)))?;
    if index == 0 {
        return Err(ShareError::InvalidShare("index must start at 1".into()));
    }

    let data = hex::decode(data).map_err(|e| ShareError::InvalidShare(e.to_string()))?;
    Ok(Share { index, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format() {
        let share = Share {
            index: 3,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        assert_eq!(export_share_hex(&share), "3:deadbeef");
    }

    #[test]
    fn test_parse_exported_share() {
        let shares = crate::split_secret(b"text form", 2).unwrap();
        for share in &shares {
            let parsed = parse_share_hex(&export_share_hex(share)).unwrap();
            assert_eq!(&parsed, share);
        }
    }

    #[test]
    fn test_parse_accepts_whitespace_and_empty_data() {
        let share = parse_share_hex("  7:\n").unwrap();
        assert_eq!(share.index, 7);
        assert!(share.data.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["deadbeef", "0:00", "256:00", "x:00", "1:abc", "1:zz"] {
            assert!(
                matches!(parse_share_hex(bad), Err(ShareError::InvalidShare(_))),
                "accepted {:?}",
                bad
            );
        }
    }
}
