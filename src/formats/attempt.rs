//! Outcome of a single parse attempt.

use crate::error::ParseFailure;

use super::FileType;

/// Result of trying one parser, with the follow-up made explicit.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// Failed, but the input may still parse as `with`.
    Retry { with: FileType, reason: ParseFailure },
    /// Failed with no fallback left.
    Failure(ParseFailure),
}

impl<T> Attempt<T> {
    /// Turn a parser result into an attempt, naming the fallback on error.
    pub fn or_retry(result: Result<T, ParseFailure>, fallback: Option<FileType>) -> Self {
        match (result, fallback) {
            (Ok(value), _) => Attempt::Success(value),
            (Err(reason), Some(with)) => Attempt::Retry { with, reason },
            (Err(reason), None) => Attempt::Failure(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Attempt::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_retry() {
        let ok: Attempt<u8> = Attempt::or_retry(Ok(1), Some(FileType::Kml));
        assert!(ok.is_success());

        let retry: Attempt<u8> = Attempt::or_retry(
            Err(ParseFailure::Markup("bad".to_string())),
            Some(FileType::Kmz),
        );
        assert!(matches!(
            retry,
            Attempt::Retry {
                with: FileType::Kmz,
                ..
            }
        ));

        let failed: Attempt<u8> =
            Attempt::or_retry(Err(ParseFailure::Structure("x".to_string())), None);
        assert!(matches!(failed, Attempt::Failure(ParseFailure::Structure(_))));
    }
}
