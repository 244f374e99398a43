//! Wall-clock timing of the payload cipher

use anyhow::{Context, Result};
use rand::RngCore;
use std::fmt;
use std::time::{Duration, Instant};
use veilqr_core::{decrypt, derive_key, encrypt};

/// Mean encrypt and decrypt time over a number of runs.
#[derive(Debug, Clone, Copy)]
pub struct CipherTiming {
    pub iterations: u32,
    pub payload_bytes: usize,
    pub encrypt: Duration,
    pub decrypt: Duration,
}

/// Encrypt and decrypt `payload_bytes` random bytes `iterations` times.
pub fn measure_cipher(passphrase: &str, payload_bytes: usize, iterations: u32) -> Result<CipherTiming> {
    anyhow::ensure!(iterations >= 1, "need at least one iteration");

    let key = derive_key(passphrase);
    let mut payload = vec![0u8; payload_bytes];
    rand::thread_rng().fill_bytes(&mut payload);

    let mut encrypt_total = Duration::ZERO;
    let mut decrypt_total = Duration::ZERO;

    for _ in 0..iterations {
        let start = Instant::now();
        let sealed = encrypt(&payload, &key).context("Encryption failed")?;
        encrypt_total += start.elapsed();

        let start = Instant::now();
        let opened = decrypt(&sealed, &key).context("Decryption failed")?;
        decrypt_total += start.elapsed();

        anyhow::ensure!(opened == payload, "cipher round trip mismatch");
    }

    let timing = CipherTiming {
        iterations,
        payload_bytes,
        encrypt: encrypt_total / iterations,
        decrypt: decrypt_total / iterations,
    };
    log::debug!("{:?}", timing);
    Ok(timing)
}

impl fmt::Display for CipherTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "AES-256-CBC over {} bytes, mean of {} runs:",
            self.payload_bytes, self.iterations
        )?;
        writeln!(f, "  Encrypt: {:.3} ms", self.encrypt.as_secs_f64() * 1e3)?;
        write!(f, "  Decrypt: {:.3} ms", self.decrypt.as_secs_f64() * 1e3)
    }
}
