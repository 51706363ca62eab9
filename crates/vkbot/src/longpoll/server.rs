//! Long-poll server acquisition.

use serde_json::Value;
use url::Url;

use crate::client::{MethodCaller, Params};

use super::error::UpstreamError;

pub(crate) const GET_LONG_POLL_SERVER: &str = "groups.getLongPollServer";

/// Endpoint, key and starting cursor handed out by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPollServer {
    pub endpoint: Url,
    pub key: String,
    pub ts: u64,
}

impl LongPollServer {
    /// Parse a `groups.getLongPollServer` response.
    pub fn from_response(response: &Value) -> Result<Self, UpstreamError> {
        let server = non_empty_str(response, "server")?;
        let key = non_empty_str(response, "key")?;
        let ts_value = response
            .get("ts")
            .ok_or(UpstreamError::MissingField("ts"))?;
        let ts = parse_ts(ts_value).ok_or_else(|| UpstreamError::InvalidField {
            field: "ts",
            reason: format!("expected a non-negative integer, got {ts_value}"),
        })?;

        // Some long-poll flavours hand out the server without a scheme.
        let endpoint = if server.contains("://") {
            Url::parse(server)
        } else {
            Url::parse(&format!("https://{server}"))
        }
        .map_err(|e| UpstreamError::InvalidField {
            field: "server",
            reason: e.to_string(),
        })?;

        Ok(Self {
            endpoint,
            key: key.to_string(),
            ts,
        })
    }
}

/// Ask the platform for a new server assignment. Does not retry.
pub async fn acquire(
    caller: &dyn MethodCaller,
    group_id: i64,
) -> Result<LongPollServer, UpstreamError> {
    let response = caller
        .call(
            GET_LONG_POLL_SERVER,
            Params::new().with("group_id", group_id),
        )
        .await?;
    LongPollServer::from_response(&response)
}

/// Cursor values arrive as decimal strings; plain integers are accepted too.
pub(crate) fn parse_ts(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn non_empty_str<'a>(response: &'a Value, field: &'static str) -> Result<&'a str, UpstreamError> {
    response
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(UpstreamError::MissingField(field))
}
