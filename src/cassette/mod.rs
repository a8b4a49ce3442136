//! Recording and replaying authority exchanges.

pub mod format;
pub mod recorder;
pub mod replayer;

pub use format::{Cassette, CassetteError, Exchange};
pub use recorder::CassetteRecorder;
pub use replayer::CassetteReplayer;
