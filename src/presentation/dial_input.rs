use thiserror::Error;

/// Longest destination the dial pad accepts (E.164 max plus a prefix)
pub const MAX_DIAL_LENGTH: usize = 15;

/// Shortest input accepted as a phone number
pub const MIN_DIAL_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialKey {
    pub symbol: char,
    pub letters: &'static str,
}

/// Keypad layout, row by row
pub const DIAL_KEYS: [DialKey; 12] = [
    DialKey { symbol: '1', letters: "" },
    DialKey { symbol: '2', letters: "ABC" },
    DialKey { symbol: '3', letters: "DEF" },
    DialKey { symbol: '4', letters: "GHI" },
    DialKey { symbol: '5', letters: "JKL" },
    DialKey { symbol: '6', letters: "MNO" },
    DialKey { symbol: '7', letters: "PQRS" },
    DialKey { symbol: '8', letters: "TUV" },
    DialKey { symbol: '9', letters: "WXYZ" },
    DialKey { symbol: '*', letters: "" },
    DialKey { symbol: '0', letters: "+" },
    DialKey { symbol: '#', letters: "" },
];

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DialValidationError {
    #[error("Please enter a phone number")]
    Empty,

    #[error("Phone number must be at least 10 digits")]
    TooShort,
}

/// Destination being typed on the dial pad
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialInput {
    value: String,
}

impl DialInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Append a key press. Returns false if the key is not dialable or
    /// the input is full.
    pub fn push(&mut self, key: char) -> bool {
        let dialable = key.is_ascii_digit() || matches!(key, '*' | '#' | '+');
        if !dialable || self.value.len() >= MAX_DIAL_LENGTH {
            return false;
        }
        self.value.push(key);
        true
    }

    /// Replace the input with typed or pasted text, keeping dialable characters only
    pub fn set(&mut self, text: &str) {
        self.value.clear();
        for c in text.chars() {
            if !self.push(c) && self.value.len() >= MAX_DIAL_LENGTH {
                break;
            }
        }
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// The destination to dial, if it looks like a phone number
    pub fn validate(&self) -> Result<&str, DialValidationError> {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            return Err(DialValidationError::Empty);
        }
        if trimmed.len() < MIN_DIAL_LENGTH {
            return Err(DialValidationError::TooShort);
        }
        Ok(trimmed)
    }
}

/// Call duration as `mm:ss`; minutes keep counting past an hour
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
