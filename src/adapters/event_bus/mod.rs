//! Event bus adapters.
//!
//! - `HttpBusAuthenticator` / `HttpEventSource` - the bus REST API
//! - `LineBuffer` / `FrameDecoder` - stream framing
//! - `MockBusAuthenticator` / `ScriptedEventSource` - test doubles

mod client;
mod frame;
mod login;
mod mock;
mod stream;

pub use client::BusClientConfig;
pub use frame::{decode_payload, DecodeError, Decoded, FrameDecoder, LineBuffer, MAX_LINE_BYTES};
pub use login::HttpBusAuthenticator;
pub use mock::{MockBusAuthenticator, ScriptedConnection, ScriptedEventSource};
pub use stream::{HttpEventSource, AUTH_TOKEN_HEADER};
