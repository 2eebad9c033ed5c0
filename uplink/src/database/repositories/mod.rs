//! Database repositories.

mod stream;

pub use stream::{SqlxStreamRepository, StreamRepository};
