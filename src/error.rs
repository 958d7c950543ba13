use thiserror::Error;

/// Operator mistakes surfaced as dialogs. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("All fields are required!")]
    MissingField,
    #[error("No user selected!")]
    NoSelection,
    #[error("Channel ID must be a valid number.")]
    InvalidChannelId(String),
    #[error("This RFID is not registered!")]
    UnknownBadge(String),
}

impl InputError {
    /// Dialog title shown above the message
    pub fn title(&self) -> &'static str {
        match self {
            InputError::MissingField => "Input Error",
            InputError::NoSelection => "Selection Error",
            InputError::InvalidChannelId(_) => "Error",
            InputError::UnknownBadge(_) => "Unknown RFID",
        }
    }

    /// The offending input, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            InputError::InvalidChannelId(s) | InputError::UnknownBadge(s) => Some(s.as_str()),
            InputError::MissingField | InputError::NoSelection => None,
        }
    }
}
