#![no_main]

use libfuzzer_sys::fuzz_target;
use veilqr_core::{decrypt_bytes, derive_key, EncryptedPayload};

fuzz_target!(|data: &[u8]| {
    // Parsing and decrypting untrusted bytes must return Ok or Err, never panic
    if let Ok(payload) = EncryptedPayload::from_bytes(data) {
        assert_eq!(payload.to_bytes(), data);
    }

    let key = derive_key("fuzz");
    let _ = decrypt_bytes(data, &key);
});
