#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

impl Error {
    pub(crate) fn io(err: std::io::Error) -> Error {
        Error::from(ErrorKind::IO(err))
    }

    pub(crate) fn coercion(value: impl Into<String>) -> Error {
        Error::from(ErrorKind::Coercion {
            value: value.into(),
        })
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Error {
        Error::from(ErrorKind::Structural { msg: msg.into() })
    }

    /// Returns the kind of error that occurred
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

/// The specific type of failure behind an [`Error`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A value could not be interpreted as a number
    Coercion { value: String },

    /// A plist did not have the expected shape
    Structural { msg: String },

    /// A Dock entry did not carry a `tile-data` dictionary
    MissingTileData,

    /// The property list could not be decoded
    Plist(plist::Error),

    /// The SQLite output sink or an introspected database failed
    Sqlite(rusqlite::Error),

    /// The CSV output sink failed
    Csv(csv::Error),

    IO(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.inner.kind {
            ErrorKind::Plist(ref err) => Some(err),
            ErrorKind::Sqlite(ref err) => Some(err),
            ErrorKind::Csv(ref err) => Some(err),
            ErrorKind::IO(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        Ok(())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ErrorKind::IO(ref err) => err.fmt(f),
            ErrorKind::Coercion { ref value } => {
                write!(f, "Unable to interpret {} as a number", value)
            }
            ErrorKind::Structural { ref msg } => {
                write!(f, "Unexpected plist structure: {}", msg)
            }
            ErrorKind::MissingTileData => {
                write!(f, "Missing tile-data dictionary")
            }
            ErrorKind::Plist(ref err) => {
                write!(f, "Invalid property list: {}", err)
            }
            ErrorKind::Sqlite(ref err) => {
                write!(f, "SQLite error: {}", err)
            }
            ErrorKind::Csv(ref err) => {
                write!(f, "CSV error: {}", err)
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: ErrorInner { kind },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::io(err)
    }
}

impl From<plist::Error> for Error {
    fn from(err: plist::Error) -> Error {
        Error::from(ErrorKind::Plist(err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Error {
        Error::from(ErrorKind::Sqlite(err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Error {
        Error::from(ErrorKind::Csv(err))
    }
}
