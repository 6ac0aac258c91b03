#![warn(missing_docs)]

//! guildmirror REST backend: drives the Discord v10 HTTP API as a
//! [`guildmirror_engine::Directory`].

pub mod cdn;
pub mod client;
pub mod error;
pub mod image;
pub mod wire;

pub use client::{RestConfig, RestDirectory, TokenKind};
pub use error::{classify_status, RestError};
