//! Port implementations: live, in-memory, recording and replaying.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;

pub use memory::{FixedClock, InMemoryAuthority};
pub use recording::RecordingAuthority;
pub use replaying::ReplayingAuthority;
