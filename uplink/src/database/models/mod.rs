//! Database row models.

mod stream;

pub use stream::TrackedStream;
