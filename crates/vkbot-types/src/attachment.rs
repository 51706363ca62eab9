//! Attachment references for outgoing messages.

use std::fmt;

/// A reference to an uploaded media object, rendered as
/// `{type}{owner_id}_{media_id}[_{access_key}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub kind: String,
    pub owner_id: i64,
    pub media_id: i64,
    pub access_key: Option<String>,
}

impl AttachmentRef {
    pub fn new(kind: impl Into<String>, owner_id: i64, media_id: i64) -> Self {
        Self {
            kind: kind.into(),
            owner_id,
            media_id,
            access_key: None,
        }
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        let key = access_key.into();
        self.access_key = (!key.is_empty()).then_some(key);
        self
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", self.kind, self.owner_id, self.media_id)?;
        if let Some(key) = &self.access_key {
            write!(f, "_{key}")?;
        }
        Ok(())
    }
}
