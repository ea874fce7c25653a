//! Error types shared by the library and the `ledger` binary.
//!
//! Internally everything is an `anyhow::Error`. Public command entry points tag their failures
//! with an `ErrorType` so that the CLI can tell the user what kind of thing went wrong.

use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure that is surfaced by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The configuration file or ledger home directory is missing or invalid.
    Config,
    /// A call to the tracker API failed or returned an unsuccessful response.
    Request,
    /// User-supplied input was rejected before it was sent.
    Validation,
    /// A submission was attempted while another one was still outstanding.
    Busy,
    /// A local file operation failed.
    Io,
}

impl ErrorType {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Config => "configuration error",
            ErrorType::Request => "request error",
            ErrorType::Validation => "invalid input",
            ErrorType::Busy => "busy",
            ErrorType::Io => "file error",
        }
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension for tagging an internal `Result` with an `ErrorType` before returning it from a
/// public command. An error that already carries an `ErrorType` keeps it.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let e: Error = e.into();
            if e.downcast_ref::<ErrorType>().is_some() {
                e
            } else {
                e.context(error_type)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_pub_result_adds_category() {
        let r: std::result::Result<(), Error> = Err(anyhow!("connection refused"));
        let e = r.pub_result(ErrorType::Request).unwrap_err();
        assert_eq!(e.to_string(), "request error");
        assert_eq!(format!("{e:#}"), "request error: connection refused");
    }

    #[test]
    fn test_pub_result_keeps_first_category() {
        let r: std::result::Result<(), Error> = Err(anyhow!("in flight"));
        let e = r
            .pub_result(ErrorType::Busy)
            .pub_result(ErrorType::Request)
            .unwrap_err();
        assert_eq!(e.to_string(), "busy");
        assert_eq!(e.downcast_ref::<ErrorType>(), Some(&ErrorType::Busy));
    }

    #[test]
    fn test_pub_result_passes_ok() {
        let r: std::result::Result<u8, Error> = Ok(7);
        assert_eq!(r.pub_result(ErrorType::Io).unwrap(), 7);
    }
}
