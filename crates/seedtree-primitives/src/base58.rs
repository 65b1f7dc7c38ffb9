use zeroize::Zeroizing;

use crate::hash::sha256d;

/// Number of double-SHA-256 bytes appended by [`check_encode`].
pub const CHECKSUM_LEN: usize = 4;

/// Base58Check: `payload ‖ sha256d(payload)[..4]`, Base58 encoded.
pub fn check_encode(payload: &[u8]) -> String {
    // payloads of xprv/zprv/WIF carry private keys
    let mut data = Zeroizing::new(Vec::with_capacity(payload.len() + CHECKSUM_LEN));
    data.extend_from_slice(payload);
    data.extend_from_slice(&sha256d(payload)[..CHECKSUM_LEN]);
    bs58::encode(&data[..]).into_string()
}

/// Decode a Base58Check string, returning the payload when the checksum holds.
///
/// Only used to verify encodings; the derivation engine never reads keys back.
pub fn check_decode(s: &str) -> Option<Vec<u8>> {
    let mut data = bs58::decode(s).into_vec().ok()?;
    if data.len() < CHECKSUM_LEN {
        return None;
    }
    let checksum = data.split_off(data.len() - CHECKSUM_LEN);
    if sha256d(&data)[..CHECKSUM_LEN] != checksum[..] {
        return None;
    }
    Some(data)
}
