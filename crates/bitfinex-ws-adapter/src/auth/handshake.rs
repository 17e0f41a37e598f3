/*
[INPUT]:  API key, payload signer, optional account stream filter
[OUTPUT]: Signed auth messages, one per transport open
[POS]:    Auth layer - builds the `event: "auth"` handshake
[UPDATE]: When the auth payload format or filter handling changes
*/

use std::fmt;

use crate::types::AuthMessage;

use super::{NonceGenerator, PayloadSigner};

/// Builds signed auth messages for the private feed
pub struct Authenticator {
    api_key: String,
    signer: Box<dyn PayloadSigner>,
    filter: Option<Vec<String>>,
    nonces: NonceGenerator,
}

impl Authenticator {
    pub fn new(
        api_key: impl Into<String>,
        signer: Box<dyn PayloadSigner>,
        filter: Option<Vec<String>>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            signer,
            filter,
            nonces: NonceGenerator::new(),
        }
    }

    /// Auth message signed with a fresh wall-clock nonce
    pub fn auth_message(&mut self) -> AuthMessage {
        let nonce = self.nonces.next();
        self.sign_with_nonce(nonce)
    }

    /// Auth message for an explicit nonce
    ///
    /// Payload is `"AUTH" + nonce`; the signature covers the payload only.
    pub fn sign_with_nonce(&self, nonce: u64) -> AuthMessage {
        let auth_payload = format!("AUTH{nonce}");
        let auth_sig = self.signer.sign(&auth_payload);
        AuthMessage {
            api_key: self.api_key.clone(),
            auth_sig,
            auth_nonce: nonce,
            auth_payload,
            event: "auth".to_string(),
            filter: self.filter.clone(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn filter(&self) -> Option<&[String]> {
        self.filter.as_deref()
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("api_key", &self.api_key)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
