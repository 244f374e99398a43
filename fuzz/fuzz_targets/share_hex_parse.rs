#![no_main]

use libfuzzer_sys::fuzz_target;
use veilqr_shares::{export_share_hex, parse_share_hex};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // A share that parses must export back to something that parses to it
    if let Ok(share) = parse_share_hex(text) {
        let exported = export_share_hex(&share);
        assert_eq!(parse_share_hex(&exported).ok(), Some(share));
    }
});
