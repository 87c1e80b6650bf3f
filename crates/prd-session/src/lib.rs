//! Interactive Session (§4.8): a bidirectional, per-request channel
//! streaming clarification rounds and sectioned generation output, over a
//! `prd-engine` run/resume call.
//!
//! Transport-agnostic by design (§1): this crate exposes a
//! [`session::SessionHandle`]'s `tokio::sync::mpsc` channel pair, not a
//! WebSocket or SSE endpoint — bridging the two is left to a transport
//! crate outside the CORE.

pub mod error;
pub mod frame;
pub mod registry;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use frame::{ClientFrame, ServerFrame, WireClarificationAnswer, WireQuestion, WireSection};
pub use registry::SessionRegistry;
pub use session::{SessionActor, SessionHandle};
