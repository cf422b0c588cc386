use std::fmt;

/// Failure of a flow execution.
///
/// `error` is the payload produced by whichever stage or selector failed; the
/// engine never wraps it. `partial` is the last value successfully produced
/// before the failure, when one is known.
pub struct FlowError<T> {
    error: anyhow::Error,
    partial: Option<T>,
}

pub type FlowResult<T> = Result<T, FlowError<T>>;

impl<T> FlowError<T> {
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    pub fn with_partial(error: anyhow::Error, partial: T) -> Self {
        Self {
            error,
            partial: Some(partial),
        }
    }

    /// Fill in `partial` unless an inner execution already supplied one.
    pub(crate) fn or_partial(mut self, partial: T) -> Self {
        if self.partial.is_none() {
            self.partial = Some(partial);
        }
        self
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn partial(&self) -> Option<&T> {
        self.partial.as_ref()
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }

    pub fn into_parts(self) -> (anyhow::Error, Option<T>) {
        (self.error, self.partial)
    }
}

impl<T> From<anyhow::Error> for FlowError<T> {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl<T> fmt::Display for FlowError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<T: fmt::Debug> fmt::Debug for FlowError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowError")
            .field("error", &self.error)
            .field("partial", &self.partial)
            .finish()
    }
}

impl<T: fmt::Debug> std::error::Error for FlowError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
