//! Documented platform limits.

// Keyboard
pub const KEYBOARD_BUTTONS_MAX: usize = 40;
pub const KEYBOARD_ROWS_MAX: usize = 10;
pub const KEYBOARD_BUTTONS_PER_ROW_MAX: usize = 5;
/// Counted in characters.
pub const BUTTON_LABEL_MAX_LENGTH: usize = 40;
/// Counted in bytes.
pub const BUTTON_PAYLOAD_MAX_LENGTH: usize = 255;

// Messages
/// Counted in characters.
pub const MESSAGE_TEXT_MAX_LENGTH: usize = 4096;
pub const MESSAGE_ATTACHMENTS_MAX: usize = 10;
pub const MESSAGE_FORWARD_MAX: usize = 10;

// Files
pub const PHOTO_MAX_SIZE: u64 = 50 * 1024 * 1024;
pub const DOC_MAX_SIZE: u64 = 200 * 1024 * 1024;
pub const AUDIO_MAX_SIZE: u64 = 200 * 1024 * 1024;
pub const VIDEO_MAX_SIZE: u64 = 2 * 1024 * 1024 * 1024;

// Rate limits
pub const API_REQUESTS_PER_SECOND: u32 = 20;
pub const MESSAGES_PER_SECOND: u32 = 20;
pub const MESSAGES_PER_DAY_PER_USER: u32 = 500;

pub const API_VERSION: &str = "5.131";

// Callback API
pub const CALLBACK_SERVERS_MAX: usize = 10;
pub const CALLBACK_TIMEOUT_SECONDS: u64 = 10;

// Storage
pub const STORAGE_KEY_MAX_LENGTH: usize = 100;
pub const STORAGE_VALUE_MAX_LENGTH: usize = 4096;
pub const STORAGE_KEYS_MAX: usize = 1000;

// Long poll
pub const LONG_POLL_WAIT_MIN: u32 = 1;
pub const LONG_POLL_WAIT_MAX: u32 = 90;
pub const LONG_POLL_WAIT_DEFAULT: u32 = 25;
