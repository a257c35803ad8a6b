use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Opaque, URL-safe token a customer uses to manage a booking without an account.
pub fn generate_cancellation_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
