use thiserror::Error;

/// Errors raised while interpreting date and duration expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// Not an ISO 8601 date or date-time.
  #[error("invalid date '{value}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]")]
  InvalidDate { value: String },

  /// Not an ISO 8601 duration.
  #[error("invalid duration '{value}': {reason}")]
  InvalidDuration { value: String, reason: String },
}
