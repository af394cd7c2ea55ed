//! Access token encoding, decoding, and validation.

pub mod claims;
pub mod codec;
pub mod validator;

pub use claims::AccessTokenClaims;
pub use codec::TokenCodec;
pub use validator::ClaimsValidator;
