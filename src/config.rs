use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::api::DEFAULT_BASE_URL;
use crate::session::{Session, SessionError};

/// Connection flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Base URL of the Quanskill API
    #[arg(long, global = true, env = "QUANSKILL_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,
    /// Bearer token; overrides the stored session
    #[arg(long, global = true, env = "QUANSKILL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Where the signed-in session is stored
    #[arg(long, global = true, env = "QUANSKILL_SESSION_FILE")]
    pub session_file: Option<PathBuf>,
    /// Per-request timeout in seconds; none unless set (0 also disables it)
    #[arg(long, global = true, env = "QUANSKILL_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub session_file: PathBuf,
    pub timeout: Option<Duration>,
}

pub fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quanskill")
        .join("session.json")
}

impl From<ConnectionArgs> for Settings {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            api_url: args.api_url,
            token: args.token.filter(|token| !token.trim().is_empty()),
            session_file: args.session_file.unwrap_or_else(default_session_file),
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

impl Settings {
    /// The explicit token if one was given, otherwise the stored session.
    pub fn session(&self) -> Result<Option<Session>, SessionError> {
        if let Some(token) = &self.token {
            return Ok(Some(Session::from_token(token.clone())));
        }
        Session::load(&self.session_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConnectionArgs {
        ConnectionArgs {
            api_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            session_file: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn defaults_resolve_to_config_dir_without_timeout() {
        let settings = Settings::from(args());
        assert!(settings.session_file.ends_with("quanskill/session.json"));
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.token, None);
    }

    #[test]
    fn explicit_timeout_is_applied() {
        let settings = Settings::from(ConnectionArgs {
            timeout_secs: Some(45),
            ..args()
        });
        assert_eq!(settings.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn zero_timeout_disables_it_and_blank_token_is_ignored() {
        let settings = Settings::from(ConnectionArgs {
            token: Some("   ".to_string()),
            timeout_secs: Some(0),
            ..args()
        });
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.token, None);
    }

    #[test]
    fn explicit_token_overrides_the_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        Session::from_token("stored").save(&path).unwrap();

        let stored = Settings::from(ConnectionArgs {
            session_file: Some(path.clone()),
            ..args()
        });
        assert_eq!(stored.session().unwrap().unwrap().access_token, "stored");

        let overridden = Settings::from(ConnectionArgs {
            session_file: Some(path),
            token: Some("flag".to_string()),
            ..args()
        });
        assert_eq!(overridden.session().unwrap().unwrap().access_token, "flag");
    }
}
