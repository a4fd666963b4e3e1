use std::fmt::{self, Display};

/// The kind of error a model provider reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The credentials were rejected.
    Unauthorized,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Moderated => write!(f, "content moderated"),
            ErrorKind::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Other => write!(f, "model error"),
        }
    }
}

impl ErrorKind {
    /// Maps an HTTP status code to the closest error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Unauthorized,
            429 => ErrorKind::RateLimitExceeded,
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimitExceeded);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Other);
    }
}
