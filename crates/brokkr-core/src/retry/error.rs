//! Error types for the retry execution engine
//!
//! This module defines the terminal outcomes of a retried operation:
//! exhausted attempts, a non-retryable failure, and interruption while
//! waiting to retry.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that can occur during retry execution
///
/// The error type is generic over `E`, the underlying error type from the
/// operation being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted
    ///
    /// The failure kept classifying as a lock conflict but the maximum
    /// number of attempts was reached. The final failure is preserved as
    /// the source.
    Exhausted {
        /// Number of retry attempts made before giving up
        attempts: u32,
        /// The error from the final attempt
        source: E,
        /// Total time spent suspended between attempts
        total_delay: Duration,
    },

    /// The failure did not classify as a lock conflict
    ///
    /// Propagated immediately without consuming a retry attempt.
    NonRetryable(E),

    /// The backoff suspension was cancelled
    ///
    /// Terminal: the operation is not retried further.
    Interrupted {
        /// Number of retry attempts made before interruption
        attempts: u32,
        /// The last error that occurred, if any
        last_error: Option<E>,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_delay,
            } => {
                write!(
                    f,
                    "retry exhausted after {} attempts ({}ms waited): {}",
                    attempts,
                    total_delay.as_millis(),
                    source
                )
            }
            RetryError::NonRetryable(source) => {
                write!(f, "non-retryable failure: {}", source)
            }
            RetryError::Interrupted {
                attempts,
                last_error,
            } => {
                if let Some(err) = last_error {
                    write!(
                        f,
                        "interrupted while waiting to retry (attempt {}): {}",
                        attempts, err
                    )
                } else {
                    write!(f, "interrupted while waiting to retry (attempt {})", attempts)
                }
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable(source) => Some(source),
            RetryError::Interrupted {
                last_error: Some(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Create a new exhausted error
    pub fn exhausted(attempts: u32, source: E, total_delay: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_delay,
        }
    }

    /// Create a new non-retryable error
    pub fn non_retryable(source: E) -> Self {
        RetryError::NonRetryable(source)
    }

    /// Create a new interrupted error
    pub fn interrupted(attempts: u32, last_error: Option<E>) -> Self {
        RetryError::Interrupted {
            attempts,
            last_error,
        }
    }

    /// Get the number of retry attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Interrupted { attempts, .. } => *attempts,
            RetryError::NonRetryable(_) => 0,
        }
    }

    /// Check if this error indicates all retries were exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if this error is non-retryable
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable(_))
    }

    /// Check if this error indicates interruption
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RetryError::Interrupted { .. })
    }

    /// Get the underlying error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable(source) => Some(source),
            RetryError::Interrupted { last_error, .. } => last_error,
        }
    }

    /// Get a reference to the underlying error
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::NonRetryable(source) => Some(source),
            RetryError::Interrupted { last_error, .. } => last_error.as_ref(),
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_delay,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_delay,
            },
            RetryError::NonRetryable(source) => RetryError::NonRetryable(f(source)),
            RetryError::Interrupted {
                attempts,
                last_error,
            } => RetryError::Interrupted {
                attempts,
                last_error: last_error.map(f),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exhausted_error() {
        let err: RetryError<io::Error> = RetryError::exhausted(
            3,
            io::Error::new(io::ErrorKind::TimedOut, "timeout"),
            Duration::from_millis(1400),
        );

        assert!(err.is_exhausted());
        assert!(!err.is_non_retryable());
        assert!(!err.is_interrupted());
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_non_retryable_error() {
        let err: RetryError<io::Error> =
            RetryError::non_retryable(io::Error::new(io::ErrorKind::NotFound, "not found"));

        assert!(err.is_non_retryable());
        assert_eq!(err.attempts(), 0);
    }

    #[test]
    fn test_interrupted_error() {
        let err: RetryError<io::Error> = RetryError::interrupted(2, None);

        assert!(err.is_interrupted());
        assert_eq!(err.attempts(), 2);
        assert!(err.source_ref().is_none());
    }

    #[test]
    fn test_into_source() {
        let err: RetryError<String> =
            RetryError::exhausted(3, "original error".to_string(), Duration::from_secs(1));
        assert_eq!(err.into_source(), Some("original error".to_string()));

        let err: RetryError<String> = RetryError::interrupted(2, Some("last".to_string()));
        assert_eq!(err.into_source(), Some("last".to_string()));

        let err: RetryError<String> = RetryError::interrupted(2, None);
        assert_eq!(err.into_source(), None);
    }

    #[test]
    fn test_map_err() {
        let err: RetryError<i32> = RetryError::exhausted(3, 42, Duration::from_secs(1));

        let mapped = err.map_err(|n| format!("error code: {}", n));
        assert!(
            matches!(mapped, RetryError::Exhausted { source, .. } if source == "error code: 42")
        );
    }

    #[test]
    fn test_display() {
        let err: RetryError<io::Error> = RetryError::exhausted(
            3,
            io::Error::new(io::ErrorKind::TimedOut, "connection timeout"),
            Duration::from_millis(1400),
        );

        let display = format!("{}", err);
        assert!(display.contains("retry exhausted"));
        assert!(display.contains("3 attempts"));
        assert!(display.contains("1400ms"));
        assert!(display.contains("connection timeout"));
    }

    #[test]
    fn test_error_source_chain() {
        let inner = io::Error::new(io::ErrorKind::TimedOut, "inner timeout");
        let err: RetryError<io::Error> =
            RetryError::exhausted(1, inner, Duration::from_millis(100));

        let source = Error::source(&err).expect("source preserved");
        assert!(source.to_string().contains("inner timeout"));
    }
}
