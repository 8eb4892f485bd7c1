use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error returned when a method token is not one of the supported verbs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported HTTP method: {0}")]
pub struct InvalidMethod(pub String);

/// The set of HTTP verbs the server understands.
///
/// Parsing is fail-closed: anything outside this set is rejected at the
/// transport boundary rather than passed through as an opaque string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Patch,
    Purge,
}

impl Method {
    /// The canonical uppercase token for this verb
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Purge => "PURGE",
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Method tokens are case-sensitive per RFC 9110; the native engine
        // always hands us the uppercase form.
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "PATCH" => Ok(Method::Patch),
            "PURGE" => Ok(Method::Purge),
            other => Err(InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_verbs() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!("PURGE".parse::<Method>().unwrap(), Method::Purge);
    }

    #[test]
    fn rejects_unknown_tokens() {
        let err = "BREW".parse::<Method>().unwrap_err();
        assert_eq!(err, InvalidMethod("BREW".to_string()));
    }

    #[test]
    fn lowercase_is_not_a_method() {
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn display_matches_token() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
