//! Request handlers for the snapshot store.

mod commits;
mod snapshot;

pub use commits::*;
pub use snapshot::*;
