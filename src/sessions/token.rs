use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

use crate::error::ModelError;

const TOKEN_BYTES: usize = 32;

/// 256 random bits from the OS, URL-safe base64 without padding.
pub fn generate_token() -> Result<String, ModelError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
