use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Option<String>,
}

/// Signed-in state: the bearer token and who it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            user: None,
        }
    }

    /// The token, unless it is blank.
    pub fn token(&self) -> Option<&str> {
        let token = self.access_token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    /// Reads the session file. A missing file means nobody is signed in.
    pub fn load(path: &Path) -> Result<Option<Session>, SessionError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let session = serde_json::from_str(&raw).map_err(|source| SessionError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_error = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|source| SessionError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw).map_err(io_error)
    }

    /// Removes the session file. Returns whether one existed.
    pub fn clear(path: &Path) -> Result<bool, SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
