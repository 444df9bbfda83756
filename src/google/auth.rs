use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use chrono::Utc;

use crate::storage::config::Config;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events",
];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read token file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse token: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Token exchange rejected: {0}")]
    ExchangeFailed(String),
}

/// Token in the shape the token endpoint hands back and the token file
/// stores. A loaded token is trusted verbatim; `expiry_date` (ms since the
/// epoch) is persisted but never checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
    pub token_type: String,
    pub expiry_date: i64,
}

pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StoredToken, AuthError> {
        let content = std::fs::read_to_string(&self.path)?;
        let token: StoredToken = serde_json::from_str(&content)?;
        Ok(token)
    }

    pub fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: String,
}

impl TokenResponse {
    fn into_stored(self, now_ms: i64) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            scope: self.scope.unwrap_or_default(),
            token_type: self.token_type,
            expiry_date: now_ms + self.expires_in * 1000,
        }
    }
}

pub struct Authorizer {
    config: Config,
    storage: TokenStorage,
    client: reqwest::Client,
    token_endpoint: String,
}

impl Authorizer {
    pub fn new(config: Config, token_path: PathBuf) -> Self {
        Self {
            config,
            storage: TokenStorage::new(token_path),
            client: reqwest::Client::new(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: String) -> Self {
        self.token_endpoint = endpoint;
        self
    }

    pub fn authorization_url(&self) -> String {
        let scope = SCOPES.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            AUTH_ENDPOINT,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(self.config.redirect_uri()),
            urlencoding::encode(&scope)
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            tracing::error!("Token exchange failed: {}", error_text);
            return Err(AuthError::ExchangeFailed(error_text));
        }

        let token_response: TokenResponse = response.json().await?;

        Ok(token_response.into_stored(Utc::now().timestamp_millis()))
    }

    /// Resolves the credential for this run: a stored token is returned
    /// as-is; otherwise the interactive authorization-code flow runs once,
    /// reading the code from `input`. A token that cannot be persisted is
    /// still returned for the current run.
    pub async fn resolve(&self, input: &mut impl BufRead) -> Result<StoredToken, AuthError> {
        match self.storage.load() {
            Ok(token) => {
                tracing::info!("Using stored token from {}", self.storage.path().display());
                return Ok(token);
            }
            Err(err) => {
                tracing::info!("No usable stored token: {}", err);
            }
        }

        println!(
            "Authorize this app by visiting this url:\n{}",
            self.authorization_url()
        );
        print!("Enter the code from that page here: ");
        io::stdout().flush()?;

        let mut code = String::new();
        input.read_line(&mut code)?;

        let token = self.exchange_code(code.trim()).await?;

        match self.storage.save(&token) {
            Ok(()) => println!("Token stored to {}", self.storage.path().display()),
            Err(err) => {
                tracing::warn!("Could not store token: {}", err);
                eprintln!("Warning: could not store token: {err}");
            }
        }

        Ok(token)
    }
}
