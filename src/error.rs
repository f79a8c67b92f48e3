use std::path::PathBuf;

use thiserror::Error;

use crate::generator::Mode;

pub type Result<T> = std::result::Result<T, Error>;

/// 変換処理で発生するエラー
#[derive(Debug, Error)]
pub enum Error {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("missing field `{path}` required for {mode} generation")]
    MissingField { path: String, mode: Mode },

    #[error("invalid value {value:?} for `{path}`: {reason}")]
    InvalidField {
        path: String,
        value: String,
        reason: String,
    },

    #[error("failed to serialize XML: {0}")]
    Serialize(#[source] std::io::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// 呼び出し側に見せるエラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Generation,
    Write,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Xml(_) | Error::Malformed(_) => ErrorKind::Parse,
            Error::MissingField { .. } | Error::InvalidField { .. } | Error::Serialize(_) => {
                ErrorKind::Generation
            }
            Error::Write { .. } | Error::Archive(_) => ErrorKind::Write,
        }
    }

    pub(crate) fn missing(path: impl Into<String>, mode: Mode) -> Self {
        Error::MissingField {
            path: path.into(),
            mode,
        }
    }

    pub(crate) fn invalid(
        path: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidField {
            path: path.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::Malformed("no root".to_string()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            Error::missing("Document.name", Mode::Template).kind(),
            ErrorKind::Generation
        );
        assert_eq!(
            Error::write("out.kmz", std::io::Error::other("disk full")).kind(),
            ErrorKind::Write
        );
    }

    #[test]
    fn test_missing_field_message() {
        let err = Error::missing("Point.coordinates", Mode::Execution);
        assert_eq!(
            err.to_string(),
            "missing field `Point.coordinates` required for execution generation"
        );
    }
}
