//! API key generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

const API_KEY_LENGTH: usize = 48;

/// Generate a new bearer API key secret
pub fn generate_api_key() -> String {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(char::from)
        .collect();
    format!("ak-{secret}")
}
