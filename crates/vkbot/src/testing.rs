//! Scripted fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::client::{Transport, TransportError};

type Reply = Result<Value, TransportError>;

/// A [`Transport`] that replays queued replies and records every request.
///
/// POSTs (method calls) and GETs (poll fetches) have separate queues. An
/// exhausted GET queue blocks forever, like a long-poll with no events; an
/// exhausted POST queue answers with HTTP 500.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    posts: Mutex<VecDeque<Reply>>,
    gets: Mutex<VecDeque<Reply>>,
    post_log: Mutex<Vec<(Url, Vec<(String, String)>)>>,
    get_log: Mutex<Vec<(Url, Duration)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_post(&self, reply: Reply) {
        self.posts.lock().unwrap().push_back(reply);
    }

    pub fn push_get(&self, reply: Reply) {
        self.gets.lock().unwrap().push_back(reply);
    }

    pub fn post_requests(&self) -> Vec<(Url, Vec<(String, String)>)> {
        self.post_log.lock().unwrap().clone()
    }

    pub fn get_requests(&self) -> Vec<(Url, Duration)> {
        self.get_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Value, TransportError> {
        self.get_log.lock().unwrap().push((url.clone(), timeout));
        let next = self.gets.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        _timeout: Duration,
    ) -> Result<Value, TransportError> {
        self.post_log
            .lock()
            .unwrap()
            .push((url.clone(), form.to_vec()));
        let next = self.posts.lock().unwrap().pop_front();
        next.unwrap_or(Err(TransportError::Status(500)))
    }
}
