//! Unique identifiers for journal entries.
//!
//! An id is the current time in milliseconds followed by 64 random bits in
//! hex. When the operating system's secure random source fails, the random
//! part comes from a seeded [`SmallRng`] mixed with a process-wide counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use rand::rngs::{OsRng, SmallRng};
use rand::{Rng, RngCore, SeedableRng};

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a new identifier, unique with overwhelming probability.
pub fn new_id() -> String {
    let millis = now_millis();
    let mut bytes = [0u8; 8];

    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("{millis}{:016x}", u64::from_be_bytes(bytes)),
        Err(e) => {
            warn!("Secure random source unavailable, using fallback id: {e}");
            fallback_id(millis)
        }
    }
}

/// Time component plus a non-cryptographic suffix.
pub(crate) fn fallback_id(millis: u128) -> String {
    let sequence = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();

    let mut rng = SmallRng::seed_from_u64(u64::from(nanos) ^ sequence.rotate_left(32));
    let suffix: u64 = rng.gen();

    format!("{millis}{}{:x}", to_base36(suffix), sequence)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
