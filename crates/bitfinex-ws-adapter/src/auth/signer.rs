/*
[INPUT]:  Authentication payload string and API secret
[OUTPUT]: Lowercase hex HMAC-SHA384 signatures
[POS]:    Auth layer - cryptographic signing for the auth handshake
[UPDATE]: When changing signing algorithm or signature encoding
*/

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha384;

use crate::error::{BitfinexError, Result};

type HmacSha384 = Hmac<Sha384>;

/// Signing capability used by the trading session
///
/// Implement this trait to sign with keys held outside the process.
pub trait PayloadSigner: Send + Sync {
    /// Sign a payload and return the signature as lowercase hex
    fn sign(&self, payload: &str) -> String;
}

/// HMAC-SHA384 signer keyed with the API secret
#[derive(Clone)]
pub struct HmacSha384Signer {
    mac: HmacSha384,
}

impl HmacSha384Signer {
    /// Create a signer from the API secret
    pub fn new(secret: &str) -> Result<Self> {
        let mac = HmacSha384::new_from_slice(secret.as_bytes())
            .map_err(|e| BitfinexError::Config(format!("invalid api secret: {e}")))?;
        Ok(Self { mac })
    }
}

impl PayloadSigner for HmacSha384Signer {
    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for HmacSha384Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSha384Signer").finish_non_exhaustive()
    }
}
