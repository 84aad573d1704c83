//! Classroom client session core.
//!
//! Pure Rust crate with no platform dependencies: one owned
//! [`room::RoomSession`] per room membership, with transport and media
//! engines injected behind trait seams and UI shells observing through
//! the event listener.

pub mod chat;
pub mod entry;
pub mod errors;
pub mod events;
pub mod media;
pub mod participants;
pub mod role;
pub mod room;
pub mod settings;
pub mod transport;

pub use chat::{ChatMessage, ChatTimeline, MessageKind, TimelineConfig};
pub use errors::SessionError;
pub use events::{SessionEvent, SessionEventListener};
pub use media::{MediaEngine, MediaError};
pub use role::{Capabilities, Role, capabilities_for};
pub use room::{EnterRoomParam, Room, RoomSession, SessionPhase, User};
pub use transport::{MembershipSnapshot, Transport, TransportError, TransportEvent};
