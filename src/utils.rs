// src/utils.rs

/// ───────────────────────── logging gate ─────────────────────────
/// Enable lightweight tracing with: `--features verbose-logs`
#[cfg(feature = "verbose-logs")]
macro_rules! trace { ($($arg:tt)*) => { ::anchor_lang::prelude::msg!($($arg)*); } }
#[cfg(not(feature = "verbose-logs"))]
macro_rules! trace { ($($arg:tt)*) => {}; }

pub fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
