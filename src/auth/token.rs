use rand::rngs::OsRng;
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Generates a session or reset token: 32 random bytes rendered as 64
/// lowercase hex characters. The length and alphabet are a compatibility
/// contract for clients.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
