//! Vkbot - A client for the VK bot API with a self-healing long-poll loop.

pub mod client;
pub mod config;
pub mod keyboard;
pub mod limits;
pub mod longpoll;
pub mod validator;

pub use vkbot_types as types;

pub use client::{ApiError, Client, MethodCaller, Params};
pub use config::Config;
pub use longpoll::{Cycle, EventHandler, LongPoll};

#[cfg(test)]
mod testing;
