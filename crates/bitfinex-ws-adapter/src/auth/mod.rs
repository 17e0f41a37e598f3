/*
[INPUT]:  API key, API secret and account stream filter
[OUTPUT]: Nonces, HMAC signatures and signed auth messages
[POS]:    Auth layer - handles Bitfinex private feed authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod handshake;
pub mod nonce;
pub mod signer;

pub use handshake::Authenticator;
pub use nonce::NonceGenerator;
pub use signer::{HmacSha384Signer, PayloadSigner};
