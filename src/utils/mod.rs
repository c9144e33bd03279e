pub mod nonce;
pub mod validation;
