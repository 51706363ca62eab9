//! Bot keyboard builder.
//!
//! Buttons are validated as they are added; the overall layout (row count,
//! buttons per row, total) is validated when the keyboard is serialized.
//!
//! ```no_run
//! # use vkbot::keyboard::{ButtonColor, Keyboard};
//! # fn main() -> Result<(), vkbot::keyboard::KeyboardError> {
//! let json = Keyboard::new()
//!     .one_time(true)
//!     .text("Yes", None, ButtonColor::Positive)?
//!     .text("No", None, ButtonColor::Negative)?
//!     .row()
//!     .link("Docs", "https://dev.vk.com")?
//!     .to_json()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::validator::{self, ValidationError};

#[derive(Debug, Error)]
pub enum KeyboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to encode keyboard: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Buttons
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    /// Blue.
    Primary,
    /// White.
    #[default]
    Secondary,
    /// Red.
    Negative,
    /// Green.
    Positive,
}

impl ButtonColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonColor::Primary => "primary",
            ButtonColor::Secondary => "secondary",
            ButtonColor::Negative => "negative",
            ButtonColor::Positive => "positive",
        }
    }
}

impl fmt::Display for ButtonColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ButtonColor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(ButtonColor::Primary),
            "secondary" => Ok(ButtonColor::Secondary),
            "negative" => Ok(ButtonColor::Negative),
            "positive" => Ok(ButtonColor::Positive),
            other => Err(ValidationError::InvalidButtonColor(other.to_string())),
        }
    }
}

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Text {
        label: String,
        payload: String,
    },
    Callback {
        label: String,
        payload: String,
    },
    OpenLink {
        label: String,
        link: String,
    },
    Location {
        payload: String,
    },
    #[serde(rename = "vkpay")]
    VkPay {
        hash: String,
    },
    OpenApp {
        label: String,
        app_id: i64,
        owner_id: i64,
        hash: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub action: Action,
    /// Only text buttons carry a color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ButtonColor>,
}

// ============================================================================
// Keyboard
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Keyboard {
    one_time: bool,
    buttons: Vec<Vec<Button>>,
    inline: bool,
}

impl Keyboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide the keyboard after a button is pressed.
    #[must_use]
    pub fn one_time(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    /// Attach the keyboard to the message instead of the input area.
    #[must_use]
    pub fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    /// Start a new row.
    #[must_use]
    pub fn row(mut self) -> Self {
        self.buttons.push(Vec::new());
        self
    }

    /// Text button. Without a payload, `{"button": label}` is sent.
    pub fn text(
        self,
        label: &str,
        payload: Option<&str>,
        color: ButtonColor,
    ) -> Result<Self, ValidationError> {
        validator::validate_button_label(label)?;
        let payload = match payload {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => json!({ "button": label }).to_string(),
        };
        validator::validate_button_payload(&payload)?;

        Ok(self.push(Button {
            action: Action::Text {
                label: label.to_string(),
                payload,
            },
            color: Some(color),
        }))
    }

    /// Callback button; the payload is wrapped as `{"callback": payload}`.
    pub fn callback(self, label: &str, payload: &str) -> Result<Self, ValidationError> {
        validator::validate_button_label(label)?;
        let payload = json!({ "callback": payload }).to_string();
        validator::validate_button_payload(&payload)?;

        Ok(self.push(Button {
            action: Action::Callback {
                label: label.to_string(),
                payload,
            },
            color: None,
        }))
    }

    pub fn link(self, label: &str, link: &str) -> Result<Self, ValidationError> {
        validator::validate_button_label(label)?;
        validator::validate_url(link)?;

        Ok(self.push(Button {
            action: Action::OpenLink {
                label: label.to_string(),
                link: link.to_string(),
            },
            color: None,
        }))
    }

    /// Location request button. The platform renders its own label.
    #[must_use]
    pub fn location(self) -> Self {
        self.push(Button {
            action: Action::Location {
                payload: json!({ "location": true }).to_string(),
            },
            color: None,
        })
    }

    #[must_use]
    pub fn vk_pay(self, hash: &str) -> Self {
        self.push(Button {
            action: Action::VkPay {
                hash: hash.to_string(),
            },
            color: None,
        })
    }

    pub fn open_app(
        self,
        label: &str,
        app_id: i64,
        owner_id: i64,
        hash: &str,
    ) -> Result<Self, ValidationError> {
        validator::validate_button_label(label)?;

        Ok(self.push(Button {
            action: Action::OpenApp {
                label: label.to_string(),
                app_id,
                owner_id,
                hash: hash.to_string(),
            },
            color: None,
        }))
    }

    fn push(mut self, button: Button) -> Self {
        match self.buttons.last_mut() {
            Some(row) => row.push(button),
            None => self.buttons.push(vec![button]),
        }
        self
    }

    pub fn rows(&self) -> &[Vec<Button>] {
        &self.buttons
    }

    /// Validate the layout and encode it for the `keyboard` parameter.
    /// Empty rows are left out.
    pub fn to_json(&self) -> Result<String, KeyboardError> {
        let mut keyboard = self.clone();
        keyboard.buttons.retain(|row| !row.is_empty());
        validator::validate_keyboard(&keyboard.buttons)?;
        Ok(serde_json::to_string(&keyboard)?)
    }

    /// Keyboard value that hides the current keyboard.
    pub fn remove() -> String {
        json!({ "buttons": [] }).to_string()
    }

    /// Text buttons from `(label, payload)` pairs, `columns` per row.
    pub fn text_grid<'a, I>(
        items: I,
        columns: usize,
        color: ButtonColor,
    ) -> Result<String, KeyboardError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let columns = columns.max(1);
        let mut keyboard = Keyboard::new();
        for (i, (label, payload)) in items.into_iter().enumerate() {
            if i % columns == 0 {
                keyboard = keyboard.row();
            }
            keyboard = keyboard.text(label, Some(payload), color)?;
        }
        keyboard.to_json()
    }

    /// Inline keyboard of callback buttons from `(label, payload)` pairs.
    pub fn callback_grid<'a, I>(items: I, columns: usize) -> Result<String, KeyboardError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let columns = columns.max(1);
        let mut keyboard = Keyboard::new().inline(true);
        for (i, (label, payload)) in items.into_iter().enumerate() {
            if i % columns == 0 {
                keyboard = keyboard.row();
            }
            keyboard = keyboard.callback(label, payload)?;
        }
        keyboard.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_button_default_payload() {
        let json = Keyboard::new()
            .text("Start", None, ButtonColor::Primary)
            .unwrap()
            .to_json()
            .unwrap();
        let value = parse(&json);

        assert_eq!(value["one_time"], false);
        assert_eq!(value["inline"], false);
        let button = &value["buttons"][0][0];
        assert_eq!(button["action"]["type"], "text");
        assert_eq!(button["action"]["label"], "Start");
        assert_eq!(button["action"]["payload"], r#"{"button":"Start"}"#);
        assert_eq!(button["color"], "primary");
    }

    #[test]
    fn first_button_opens_a_row() {
        let keyboard = Keyboard::new().location().vk_pay("action=transfer");
        assert_eq!(keyboard.rows().len(), 1);
        assert_eq!(keyboard.rows()[0].len(), 2);

        let value = parse(&keyboard.to_json().unwrap());
        assert_eq!(value["buttons"][0][0]["action"]["type"], "location");
        assert_eq!(value["buttons"][0][1]["action"]["type"], "vkpay");
        assert!(value["buttons"][0][1].get("color").is_none());
    }

    #[test]
    fn callback_and_link_buttons() {
        let keyboard = Keyboard::new()
            .inline(true)
            .callback("Like", "like:42")
            .unwrap()
            .row()
            .link("Site", "https://example.com")
            .unwrap()
            .open_app("App", 1, -2, "start")
            .unwrap();

        let value = parse(&keyboard.to_json().unwrap());
        assert_eq!(value["inline"], true);
        assert_eq!(
            value["buttons"][0][0]["action"]["payload"],
            r#"{"callback":"like:42"}"#
        );
        assert_eq!(value["buttons"][1][0]["action"]["type"], "open_link");
        assert_eq!(value["buttons"][1][1]["action"]["type"], "open_app");
        assert_eq!(value["buttons"][1][1]["action"]["owner_id"], -2);
    }

    #[test]
    fn invalid_buttons_are_rejected() {
        assert!(matches!(
            Keyboard::new().text("", None, ButtonColor::Primary),
            Err(ValidationError::EmptyButtonLabel)
        ));
        assert!(matches!(
            Keyboard::new().link("Bad", "nope"),
            Err(ValidationError::InvalidUrl(_))
        ));
        let big = "x".repeat(300);
        assert!(matches!(
            Keyboard::new().callback("Big", &big),
            Err(ValidationError::ButtonPayloadTooLong { .. })
        ));
    }

    #[test]
    fn layout_checked_on_encode() {
        let mut keyboard = Keyboard::new();
        for i in 0..6 {
            keyboard = keyboard
                .text(&format!("b{i}"), None, ButtonColor::Secondary)
                .unwrap();
        }
        assert!(matches!(
            keyboard.to_json(),
            Err(KeyboardError::Validation(
                ValidationError::TooManyButtonsInRow { row: 0, count: 6, .. }
            ))
        ));
    }

    #[test]
    fn empty_rows_are_dropped_on_encode() {
        let keyboard = Keyboard::new()
            .row()
            .text("Yes", None, ButtonColor::Positive)
            .unwrap()
            .row()
            .row();
        assert_eq!(keyboard.rows().len(), 3);

        let value = parse(&keyboard.to_json().unwrap());
        let rows = value["buttons"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0]["action"]["label"], "Yes");

        let value = parse(&Keyboard::new().row().to_json().unwrap());
        assert_eq!(value["buttons"], serde_json::json!([]));
    }

    #[test]
    fn grids_wrap_rows() {
        let items = [("A", "a"), ("B", "b"), ("C", "c"), ("D", "d"), ("E", "e")];
        let value = parse(&Keyboard::text_grid(items, 2, ButtonColor::Positive).unwrap());
        let rows = value["buttons"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].as_array().unwrap().len(), 1);
        assert_eq!(rows[0][1]["action"]["payload"], "b");

        let value = parse(&Keyboard::callback_grid([("X", "x"), ("Y", "y")], 3).unwrap());
        assert_eq!(value["inline"], true);
        assert_eq!(value["buttons"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn remove_keyboard() {
        assert_eq!(Keyboard::remove(), r#"{"buttons":[]}"#);
    }

    #[test]
    fn color_parsing() {
        assert_eq!("negative".parse::<ButtonColor>(), Ok(ButtonColor::Negative));
        assert!("green".parse::<ButtonColor>().is_err());
        assert_eq!(ButtonColor::default().to_string(), "secondary");
    }
}
