//! Bots Long Poll: receive community events over held-open HTTP requests.
//!
//! A [`LongPoll`] acquires a server assignment (endpoint, key and cursor)
//! through `groups.getLongPollServer`, then repeatedly fetches from that
//! endpoint. Each [`LongPoll::step`] is one transition of the state machine
//! and yields a [`Cycle`]:
//!
//! | State          | Outcome                  | Next state     |
//! |----------------|--------------------------|----------------|
//! | Uninitialized  | acquired                 | Polling        |
//! | Polling        | updates                  | Polling        |
//! | Polling        | `failed: 1`              | Polling        |
//! | Polling        | `failed: 2`, `failed: 3` | Recovering     |
//! | Polling        | timeout, bad response    | Recovering     |
//! | Recovering     | acquired                 | Polling        |
//! | any            | acquisition failed       | unchanged      |
//!
//! [`LongPoll::listen`] drives `step` until cancelled and hands every event
//! to an [`EventHandler`].

mod dispatch;
mod error;
mod poller;
mod server;
mod session;

pub use dispatch::{DispatchReport, EventHandler, dispatch};
pub use error::{FetchError, UpstreamError};
pub use poller::{Cycle, ListenSummary, LongPoll};
pub use server::{LongPollServer, acquire};
pub use session::{PollState, SessionState, Wait};
