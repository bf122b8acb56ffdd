use std::fmt;

#[derive(Debug)]
pub enum RawHtmlError {
    InvalidInput(String),
    Io(std::io::Error),
}

impl fmt::Display for RawHtmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawHtmlError::InvalidInput(message) => write!(f, "invalid input: {}", message),
            RawHtmlError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for RawHtmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RawHtmlError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RawHtmlError {
    fn from(value: std::io::Error) -> Self {
        RawHtmlError::Io(value)
    }
}
