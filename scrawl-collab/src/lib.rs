//! # scrawl-collab — scene synchronization layer for Scrawl
//!
//! Keeps two independently-evolving canvases consistent over one TCP link.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐      TCP, length-framed      ┌──────────────┐
//! │ host endpoint│ ◄──────────────────────────► │ peer endpoint│
//! └──────┬───────┘      binary protocol         └──────┬───────┘
//!        │                                             │
//!        ▼                                             ▼
//! ┌──────────────┐                              ┌──────────────┐
//! │ SyncSession  │  dispatch + replies          │ SyncSession  │
//! └──────┬───────┘                              └──────┬───────┘
//!        │                                             │
//!        ▼                                             ▼
//! ┌──────────────┐                              ┌──────────────┐
//! │ SceneStore   │  single source of truth      │ SceneStore   │
//! └──────────────┘                              └──────────────┘
//! ```
//!
//! Once connected the two roles are symmetric: either side pushes local
//! edits unsolicited and answers the other's pull requests.
//!
//! ## Modules
//!
//! - [`protocol`] — closed message vocabulary, length framing, bincode
//!   bodies
//! - [`link`] — TCP transport: host/peer establishment, writer task,
//!   receive loop
//! - [`session`] — the inbound transition table and the outbound edit
//!   operations

pub mod link;
pub mod protocol;
pub mod session;

// Re-exports for convenience
pub use link::{Inbound, LinkConfig, LinkError, LinkRole, LinkTransport};
pub use protocol::{Message, TaggedShape, WireError, HEADER_LEN, MAX_FRAME_LEN};
pub use session::{SessionEvent, SyncSession};
