//! Live adapters for real external interactions.

pub mod authority;
pub mod clock;

pub use authority::{HttpAuthority, HttpAuthorityConfig};
pub use clock::SystemClock;
