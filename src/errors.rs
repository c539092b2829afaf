use std::fmt;

/// Error type for catalog, storage and shell operations.
///
/// Each variant carries a distinct error code so the shell can report
/// failures uniformly and tests can assert on the kind of failure.
#[derive(Debug)]
pub enum Error {
    /// I/O-related error (e.g., snapshot or export file operations).
    /// Error code: 1000
    Io(std::io::Error),
    /// A table with the requested name already exists.
    /// Error code: 2000
    TableExists(String),
    /// No table with the requested name exists.
    /// Error code: 2100
    TableNotFound(String),
    /// Statement syntax or literal error raised by the shell.
    /// Error code: 3000
    Syntax(String),
    /// Invalid table schema (e.g., no columns).
    /// Error code: 5000
    Schema(String),
    /// Write payload references a column the table does not declare.
    /// Error code: 5100
    Column(String),
    /// Snapshot, metadata or document encoding error.
    /// Error code: 6000
    Encoding(String),
    /// Shell command used without its required argument (e.g., `use` with no name).
    /// Error code: 7000
    InvalidOperation(String),
    /// Miscellaneous uncategorized error.
    /// Error code: 9000
    Other(String),
}

impl Error {
    /// Returns the error code associated with this error variant.
    ///
    /// # Examples
    /// ```
    /// use minidbms::errors::Error;
    /// let err = Error::TableNotFound("Table 'shop.orders' does not exist".to_string());
    /// assert_eq!(err.code(), 2100);
    /// ```
    pub fn code(&self) -> u32 {
        match self {
            Error::Io(_) => 1000,
            Error::TableExists(_) => 2000,
            Error::TableNotFound(_) => 2100,
            Error::Syntax(_) => 3000,
            Error::Schema(_) => 5000,
            Error::Column(_) => 5100,
            Error::Encoding(_) => 6000,
            Error::InvalidOperation(_) => 7000,
            Error::Other(_) => 9000,
        }
    }

    /// Returns a human-readable error category for this error variant.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "I/O",
            Error::TableExists(_) => "Table Exists",
            Error::TableNotFound(_) => "Table Not Found",
            Error::Syntax(_) => "Syntax",
            Error::Schema(_) => "Schema",
            Error::Column(_) => "Column",
            Error::Encoding(_) => "Encoding",
            Error::InvalidOperation(_) => "Invalid Operation",
            Error::Other(_) => "Other",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "[{}] I/O Error: {}", self.code(), e),
            Error::TableExists(msg) => write!(f, "[{}] Table Exists: {}", self.code(), msg),
            Error::TableNotFound(msg) => {
                write!(f, "[{}] Table Not Found: {}", self.code(), msg)
            }
            Error::Syntax(msg) => write!(f, "[{}] Syntax Error: {}", self.code(), msg),
            Error::Schema(msg) => write!(f, "[{}] Schema Error: {}", self.code(), msg),
            Error::Column(msg) => write!(f, "[{}] Column Error: {}", self.code(), msg),
            Error::Encoding(msg) => write!(f, "[{}] Encoding Error: {}", self.code(), msg),
            Error::InvalidOperation(msg) => {
                write!(f, "[{}] Invalid Operation: {}", self.code(), msg)
            }
            Error::Other(msg) => write!(f, "[{}] Unknown Error: {}", self.code(), msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(format!("JSON error: {}", err))
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(err: bincode::error::EncodeError) -> Self {
        Error::Encoding(format!("Failed to encode snapshot. {}", err))
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(err: bincode::error::DecodeError) -> Self {
        Error::Encoding(format!("Failed to decode snapshot. {}", err))
    }
}

impl From<time::error::Format> for Error {
    fn from(err: time::error::Format) -> Self {
        Error::Encoding(format!("Failed to format timestamp. {}", err))
    }
}

/// Convenience macro to create an `Error` with a formatted message.
///
/// # Examples
/// ```
/// use minidbms::err;
/// let err = err!(Syntax, "Missing WHERE clause");
/// assert_eq!(err.code(), 3000);
/// assert_eq!(err.to_string(), "[3000] Syntax Error: Missing WHERE clause");
///
/// let err = err!(TableNotFound, "Table '{}' does not exist", "users");
/// assert_eq!(err.code(), 2100);
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident, $msg:expr) => {
        $crate::errors::Error::$variant($msg.to_string())
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::Error::$variant(format!($fmt, $($arg)*))
    };
}
