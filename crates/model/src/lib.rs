#![doc = include_str!("../README.md")]

pub mod client;
pub mod juju;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parsing;

pub use client::ModelClient;
pub use juju::JujuCliClient;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockModelClient;
