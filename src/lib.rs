//! # gbxremote
//!
//! Async client for the GBXRemote 2 protocol: the GameBox (Nadeo /
//! Trackmania) remote-control dialect of XML-RPC over a persistent TCP
//! connection.
//!
//! ## Architecture
//!
//! - **Frame protocol**: 8-byte little-endian header (`body_length`,
//!   `handle`) plus an XML body; a length-prefixed banner opens the
//!   connection.
//! - **Correlation**: every call gets a client-assigned handle with the
//!   top bit set; the server echoes it on the reply. Frames with the
//!   top bit clear are server-initiated callbacks.
//! - **Runtime**: one receive-loop task per connection routes frames to
//!   pending calls or to callback subscribers; callbacks run detached so
//!   a slow handler never stalls the loop.
//!
//! ## Example
//!
//! ```ignore
//! use gbxremote::{GbxClient, Value};
//!
//! #[tokio::main]
//! async fn main() -> gbxremote::Result<()> {
//!     let client = GbxClient::new();
//!     client.connect("127.0.0.1", 5000).await?;
//!     let methods = client.call("system.listMethods", vec![]).await?;
//!     println!("{methods:?}");
//!     client.disconnect().await
//! }
//! ```

pub mod codec;
pub mod protocol;

mod client;
mod error;
mod handle;
mod pending;

pub use client::{ClientConfig, GbxClient, State};
pub use codec::{MethodCall, MethodResponse, Value};
pub use error::{GbxError, Result};
