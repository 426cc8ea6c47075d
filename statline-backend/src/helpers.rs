use rand::RngExt;
use statline_db::API_KEY_LEN;

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Mint a fresh API key: 24 characters over A-Z0-9. Keys are bearer tokens
/// for a hobby-grade API, not secrets, so the thread RNG is enough.
pub fn generate_api_key() -> String {
  let mut rng = rand::rng();
  (0..API_KEY_LEN)
    .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
    .collect()
}
