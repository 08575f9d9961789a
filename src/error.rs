use thiserror::Error;

/// Classifies build failures for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildErrorKind {
    /// The keyset holds no keys
    EmptyKeyset,
    /// A key of length zero was supplied
    EmptyKey,
    /// Node count or tail size exceeds the 32-bit addressing of the format
    SizeLimit,
    /// Memory could not be reserved
    ResourceExhausted,
}

/// Trie error types
#[derive(Error, Debug)]
pub enum TrieError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Build error: {message}")]
    Build {
        kind: BuildErrorKind,
        message: String,
    },

    #[error("Corrupt format: {0}")]
    CorruptFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrieError {
    pub(crate) fn build(kind: BuildErrorKind, message: impl Into<String>) -> Self {
        TrieError::Build {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        TrieError::CorruptFormat(message.into())
    }

    /// Returns the build failure kind, if this is a build error.
    pub fn build_kind(&self) -> Option<BuildErrorKind> {
        match self {
            TrieError::Build { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_kind_is_matchable() {
        let err = TrieError::build(BuildErrorKind::EmptyKeyset, "keyset is empty");
        match &err {
            TrieError::Build { kind, .. } => {
                assert!(matches!(kind, BuildErrorKind::EmptyKeyset));
            }
            _ => panic!("expected Build"),
        }
        assert_eq!(err.build_kind(), Some(BuildErrorKind::EmptyKeyset));
    }

    #[test]
    fn test_build_error_display_includes_message() {
        let err = TrieError::build(BuildErrorKind::EmptyKey, "key 3 is empty");
        let display = format!("{}", err);
        assert!(display.contains("key 3 is empty"), "got: {}", display);
    }

    #[test]
    fn test_corrupt_format_has_no_build_kind() {
        let err = TrieError::corrupt("bad magic");
        assert!(err.build_kind().is_none());
        assert_eq!(format!("{}", err), "Corrupt format: bad magic");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TrieError = io.into();
        assert!(matches!(err, TrieError::Io(_)));
    }
}
