#![doc = include_str!("../README.md")]

pub mod auth;
pub mod client;
pub mod continuation;
pub mod error;
pub mod paging;
pub mod polling;

pub use error::RemoteRenderingError;
