use thiserror::Error as ThisError;

pub type TestUtilsResult<T> = Result<T, TestUtilsError>;

#[derive(Debug, ThisError)]
pub enum TestUtilsError {
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Fixture error: {0}")]
    FixtureError(String),
}

impl From<anoncreds_types::Error> for TestUtilsError {
    fn from(err: anoncreds_types::Error) -> Self {
        Self::FixtureError(err.to_string())
    }
}

impl From<anoncreds_types::ConversionError> for TestUtilsError {
    fn from(err: anoncreds_types::ConversionError) -> Self {
        Self::FixtureError(err.to_string())
    }
}

impl From<std::io::Error> for TestUtilsError {
    fn from(err: std::io::Error) -> Self {
        Self::FixtureError(format!("I/O failure: {err}"))
    }
}
