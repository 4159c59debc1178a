use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2`: input or configuration problem
/// - `3`: not enough data to fit
/// - `4`: degenerate fit or output failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message with context (e.g. the replicate being analysed).
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            exit_code: self.exit_code,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the growth analysis itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error("Insufficient data: {found} sample(s) available, at least {required} required")]
    InsufficientData { found: usize, required: usize },
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GrowthError {
    pub fn exit_code(&self) -> u8 {
        match self {
            GrowthError::InvalidConfig(_) => 2,
            GrowthError::InsufficientData { .. } => 3,
            GrowthError::DegenerateFit(_) => 4,
        }
    }
}

impl From<GrowthError> for AppError {
    fn from(err: GrowthError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_errors_map_to_exit_codes() {
        let err: AppError = GrowthError::InsufficientData { found: 0, required: 3 }.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("0 sample(s)"));

        let err: AppError = GrowthError::DegenerateFit("slope <= 0".to_string()).into();
        assert_eq!(err.exit_code(), 4);

        let err: AppError = GrowthError::InvalidConfig("min_points".to_string()).into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn context_prefixes_message() {
        let err = AppError::new(3, "too few points").context("Replicate1");
        assert_eq!(err.to_string(), "Replicate1: too few points");
        assert_eq!(err.exit_code(), 3);
    }
}
