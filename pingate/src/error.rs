use thiserror::Error;

#[derive(Error, Debug)]
pub enum PinGateError {
    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Please enter a PIN")]
    EmptySecret,

    #[error("PIN too short: at least {0} characters required")]
    SecretTooShort(usize),

    #[error("A PIN is already enrolled")]
    AlreadyEnrolled,

    #[error("No PIN enrolled")]
    NotEnrolled,

    #[error("Attempts exhausted - application data is being cleared")]
    LockedOut,
}

impl PinGateError {
    /// Stable code for front ends.
    pub fn code(&self) -> &'static str {
        match self {
            PinGateError::KeyUnavailable(_) => "KEY_UNAVAILABLE",
            PinGateError::Encryption(_) => "ENCRYPTION_ERROR",
            PinGateError::Storage(_) => "STORAGE_ERROR",
            PinGateError::Config(_) => "CONFIG_ERROR",
            PinGateError::Serialization(_) => "SERIALIZATION_ERROR",
            PinGateError::Io(_) => "IO_ERROR",
            PinGateError::EmptySecret => "EMPTY_SECRET",
            PinGateError::SecretTooShort(_) => "SECRET_TOO_SHORT",
            PinGateError::AlreadyEnrolled => "ALREADY_ENROLLED",
            PinGateError::NotEnrolled => "NOT_ENROLLED",
            PinGateError::LockedOut => "LOCKED_OUT",
        }
    }

    /// The user can retry the same operation after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PinGateError::Encryption(_)
                | PinGateError::EmptySecret
                | PinGateError::SecretTooShort(_)
        )
    }
}

impl serde::Serialize for PinGateError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PinGateError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, PinGateError>;
