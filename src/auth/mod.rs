// OAuth token lifecycle for the Google connection
// Exchange, refresh-before-use, and best-effort revocation

pub mod state;
pub mod tokens;

pub use state::{authorization_url, decode_state, encode_state, StatePayload};
pub use tokens::{RawTokenResponse, TokenManager};
