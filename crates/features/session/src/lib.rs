//! # Command Sessions
//!
//! Server side of the interactive command stream. A connection's first envelope performs the
//! handshake; every later payload drives a per-connection protocol state machine that lists,
//! reads and creates encrypted vault records.
//!
//! ## Layout
//! * [`Machine`]: pure state machine, no I/O.
//! * [`SessionEngine`] / [`Conversation`]: binds the machine to storage, the record codec and
//!   the registry.
//! * [`SessionRegistry`]: live sessions of this process, mirrored into storage.
//! * [`Notifier`]: "new record" notices to the creator's other sessions.
//! * [`serve`]: reader, consumer and writer loops around a [`TransportStream`] /
//!   [`TransportSink`] pair.

mod draft;
mod engine;
mod error;
pub mod machine;
mod notifier;
mod pump;
mod registry;
mod session;
pub mod texts;

pub use crate::draft::RecordDraft;
pub use crate::engine::{Conversation, SessionEngine};
pub use crate::error::{SessionError, SessionErrorExt, TransportError};
pub use crate::machine::{Machine, Outcome, Request, Step};
pub use crate::notifier::Notifier;
pub use crate::pump::{TransportSink, TransportStream, serve};
pub use crate::registry::SessionRegistry;
pub use crate::session::SessionHandle;
