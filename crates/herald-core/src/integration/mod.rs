//! Integration layer - the capability surface implemented by a platform.

pub mod client;

pub use client::{BoxedClient, Client};
