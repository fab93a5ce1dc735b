//! Cache policies and the client that composes them.

pub mod client;
pub mod documents;
pub mod error;
pub mod guard;
pub mod pagination;
pub mod transport;
pub mod updates;
