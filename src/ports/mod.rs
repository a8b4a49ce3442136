//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the allocation core and an
//! external system (the cluster authority, time). Implementations live in
//! `src/adapters/`.

pub mod authority;
pub mod clock;

pub use authority::IdAuthority;
pub use clock::Clock;
