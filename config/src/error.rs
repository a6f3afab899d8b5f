use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Validation(String),
    Env(String),
}

impl ConfigError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn env(message: impl Into<String>) -> Self {
        Self::Env(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Io(message)
            | Self::Parse(message)
            | Self::Validation(message)
            | Self::Env(message) => message.as_str(),
        }
    }

    pub fn into_message(self) -> String {
        match self {
            Self::Io(message)
            | Self::Parse(message)
            | Self::Validation(message)
            | Self::Env(message) => message,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for smd_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.into_message())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
