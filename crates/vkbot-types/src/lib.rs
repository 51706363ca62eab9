//! Data types for the bot platform API.
//!
//! These types describe what the platform sends back: long-poll events and
//! the objects carried inside them. They have no I/O and no async, so a
//! consumer can depend on them without pulling in the HTTP client.

mod attachment;
mod chat;
mod event;
mod message;
mod user;

pub use attachment::AttachmentRef;
pub use chat::Chat;
pub use event::{Event, event_types};
pub use message::Message;
pub use user::User;
