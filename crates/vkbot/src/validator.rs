//! Checks against the platform's documented limits.
//!
//! Lengths of user-visible text are counted in characters, payload sizes in
//! bytes, the same way the platform counts them.

use thiserror::Error;
use url::Url;

use crate::limits;

/// A value that the platform would reject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message text is too long ({length} characters), maximum is {max}")]
    MessageTooLong { length: usize, max: usize },

    #[error("button label cannot be empty")]
    EmptyButtonLabel,

    #[error("button label is too long ({length} characters), maximum is {max}")]
    ButtonLabelTooLong { length: usize, max: usize },

    #[error("button payload is too long ({length} bytes), maximum is {max}")]
    ButtonPayloadTooLong { length: usize, max: usize },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("too many rows in keyboard ({count}), maximum is {max}")]
    TooManyRows { count: usize, max: usize },

    #[error("too many buttons in row {row} ({count}), maximum is {max}")]
    TooManyButtonsInRow { row: usize, count: usize, max: usize },

    #[error("too many buttons in keyboard ({count}), maximum is {max}")]
    TooManyButtons { count: usize, max: usize },

    #[error("invalid button color: {0}, allowed: primary, secondary, negative, positive")]
    InvalidButtonColor(String),

    #[error("invalid api version format: {0}")]
    InvalidApiVersion(String),
}

pub fn validate_message_text(text: &str) -> Result<(), ValidationError> {
    let length = text.chars().count();
    if length > limits::MESSAGE_TEXT_MAX_LENGTH {
        return Err(ValidationError::MessageTooLong {
            length,
            max: limits::MESSAGE_TEXT_MAX_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_button_label(label: &str) -> Result<(), ValidationError> {
    if label.is_empty() {
        return Err(ValidationError::EmptyButtonLabel);
    }
    let length = label.chars().count();
    if length > limits::BUTTON_LABEL_MAX_LENGTH {
        return Err(ValidationError::ButtonLabelTooLong {
            length,
            max: limits::BUTTON_LABEL_MAX_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_button_payload(payload: &str) -> Result<(), ValidationError> {
    let length = payload.len();
    if length > limits::BUTTON_PAYLOAD_MAX_LENGTH {
        return Err(ValidationError::ButtonPayloadTooLong {
            length,
            max: limits::BUTTON_PAYLOAD_MAX_LENGTH,
        });
    }
    Ok(())
}

/// Absolute `http`/`https` URL with a host.
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ValidationError::InvalidUrl(url.to_string())),
    }
}

/// Row count, per-row count and total count of a keyboard layout.
pub fn validate_keyboard<T>(rows: &[Vec<T>]) -> Result<(), ValidationError> {
    if rows.len() > limits::KEYBOARD_ROWS_MAX {
        return Err(ValidationError::TooManyRows {
            count: rows.len(),
            max: limits::KEYBOARD_ROWS_MAX,
        });
    }

    for (row, buttons) in rows.iter().enumerate() {
        if buttons.len() > limits::KEYBOARD_BUTTONS_PER_ROW_MAX {
            return Err(ValidationError::TooManyButtonsInRow {
                row,
                count: buttons.len(),
                max: limits::KEYBOARD_BUTTONS_PER_ROW_MAX,
            });
        }
    }

    let total: usize = rows.iter().map(Vec::len).sum();
    if total > limits::KEYBOARD_BUTTONS_MAX {
        return Err(ValidationError::TooManyButtons {
            count: total,
            max: limits::KEYBOARD_BUTTONS_MAX,
        });
    }

    Ok(())
}

/// `MAJOR.MINOR`, e.g. `5.131`.
pub fn validate_api_version(version: &str) -> Result<(), ValidationError> {
    let valid = version
        .split_once('.')
        .is_some_and(|(major, minor)| is_digits(major) && is_digits(minor));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidApiVersion(version.to_string()))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Cut `text` to at most `max_length` characters, ending with `suffix`.
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

/// Split `text` into chunks of at most `max_length` characters.
///
/// Lines are packed greedily and joined with `\n`; a single line longer than
/// the limit is cut into fixed-size pieces.
pub fn split_long_text(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if current_len + line_len + 1 <= max_length {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            messages.push(std::mem::take(&mut current));
        }

        if line_len > max_length {
            let chars: Vec<char> = line.chars().collect();
            messages.extend(chars.chunks(max_length).map(|c| c.iter().collect()));
            current_len = 0;
        } else {
            current.push_str(line);
            current_len = line_len;
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }

    messages
}
