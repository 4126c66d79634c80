//! Authentication: token extraction and verification.

pub mod claims;
pub mod extract;
pub mod verify;

pub use claims::{AuthContext, Claims};
pub use extract::{extract_token, ExtractedToken};
pub use verify::Verifier;
