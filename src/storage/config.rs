use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Failed to parse redirect_uris: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("redirect_uris contains no entries")]
    EmptyRedirectUris,
}

const CLIENT_ID_VAR: &str = "client_id";
const CLIENT_SECRET_VAR: &str = "client_secret";
const REDIRECT_URIS_VAR: &str = "redirect_uris";

/// OAuth client configuration, read once at startup. `redirect_uris` is a
/// JSON-encoded array in the environment; the first entry is the one used.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client_id = required(&get, CLIENT_ID_VAR)?;
        let client_secret = required(&get, CLIENT_SECRET_VAR)?;
        let raw_uris = required(&get, REDIRECT_URIS_VAR)?;

        let redirect_uris: Vec<String> = serde_json::from_str(&raw_uris)?;
        if redirect_uris.is_empty() {
            return Err(ConfigError::EmptyRedirectUris);
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uris,
        })
    }

    /// First configured redirect URI. `from_vars` guarantees the list is
    /// non-empty.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uris[0]
    }
}

fn required(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    get(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}
