//! Resolution of the runnable part thread limit.

use crate::expression::{self, ExpressionError};
use crate::ConfigError;

/// How many partition threads may be runnable at the same time.
///
/// This limits runnable threads, not alive threads: every partition always
/// gets its own thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunnablePartThreadLimit {
    /// Leaves one processor for the OS and one for the solver thread.
    #[default]
    Auto,
    /// No cap.
    Unlimited,
    /// An arithmetic expression, see [`expression`](crate::expression).
    Expression(String),
}

impl RunnablePartThreadLimit {
    pub const AUTO: &'static str = "AUTO";
    pub const UNLIMITED: &'static str = "UNLIMITED";

    /// Interprets a configured value; unset means `AUTO`.
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None => Self::Auto,
            Some(v) if v.eq_ignore_ascii_case(Self::AUTO) => Self::Auto,
            Some(v) if v.eq_ignore_ascii_case(Self::UNLIMITED) => Self::Unlimited,
            Some(v) => Self::Expression(v.to_string()),
        }
    }

    /// Resolves to a permit count, `None` meaning unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreadLimit`] if the expression cannot be
    /// evaluated, resolves below 1 or does not fit a `usize`.
    ///
    /// ```
    /// use tessera_config::RunnablePartThreadLimit;
    ///
    /// assert_eq!(RunnablePartThreadLimit::Auto.resolve(8).unwrap(), Some(6));
    /// assert_eq!(RunnablePartThreadLimit::Auto.resolve(2).unwrap(), Some(1));
    /// assert_eq!(RunnablePartThreadLimit::Unlimited.resolve(8).unwrap(), None);
    ///
    /// let half = RunnablePartThreadLimit::from_config(Some("availableProcessorCount / 2"));
    /// assert_eq!(half.resolve(6).unwrap(), Some(3));
    /// ```
    pub fn resolve(&self, available_processors: usize) -> Result<Option<usize>, ConfigError> {
        match self {
            Self::Auto => Ok(Some(available_processors.saturating_sub(2).max(1))),
            Self::Unlimited => Ok(None),
            Self::Expression(script) => {
                let value = expression::evaluate(script, available_processors)
                    .map_err(|source| invalid(script, source))?
                    .floor();
                if !value.is_finite() || value >= usize::MAX as f64 {
                    return Err(ConfigError::InvalidThreadLimit {
                        expression: script.clone(),
                        reason: format!("resolved to {value}, which does not fit a thread count"),
                    });
                }
                if value < 1.0 {
                    return Err(ConfigError::InvalidThreadLimit {
                        expression: script.clone(),
                        reason: format!("resolved to {value}, which is lower than 1"),
                    });
                }
                let resolved = value as usize;
                if resolved > available_processors {
                    tracing::debug!(
                        event = "runnable_thread_limit_oversubscribed",
                        resolved,
                        available_processors,
                        "runnable part thread limit exceeds the available processors; \
                         the OS will round-robin the CPU"
                    );
                }
                Ok(Some(resolved))
            }
        }
    }
}

fn invalid(script: &str, source: ExpressionError) -> ConfigError {
    ConfigError::InvalidThreadLimit {
        expression: script.to_string(),
        reason: source.to_string(),
    }
}
