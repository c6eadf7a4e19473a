use thiserror::Error;

/// Failure of one backend call.
///
/// These stay local to the component that issued the call; nothing in the
/// console treats a `FetchError` as fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{0} is not available for this cluster")]
    Unavailable(String),

    #[error("query rejected: {0}")]
    Rejected(String),
}

impl FetchError {
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::Unavailable(what.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Flattens an error chain into at most three lines for the status bar.
pub fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{FetchError, compact_error};
    use anyhow::Context;

    #[test]
    fn backend_error_renders_status_and_body() {
        let error = FetchError::Backend {
            status: 502,
            body: "upstream down".to_string(),
        };
        assert_eq!(error.to_string(), "backend returned 502: upstream down");
    }

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = Err::<(), _>(anyhow::anyhow!("root"))
            .context("middle")
            .context("outer")
            .context("top")
            .unwrap_err();
        assert_eq!(
            compact_error(&error),
            "top\ncaused by: outer\ncaused by: middle"
        );
    }
}
