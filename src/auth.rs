//! OAuth2 credential provider shared by the Drive and Gmail tools
//!
//! One provider, parameterized by a [`ScopeSet`] and the token cache file that
//! belongs to it. Token refresh and the interactive installed-app flow are
//! handled by `yup-oauth2`; this module decides which scopes to ask for,
//! where tokens live, and turns the result into a [`Credential`].

use chrono::{DateTime, Utc};
use google_drive3::DriveHub;
use google_gmail1::{common::GetToken, hyper_rustls, hyper_util, yup_oauth2, Gmail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CleanupError, Result};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
/// Required by `messages.delete`; trash only needs gmail.modify
pub const GMAIL_FULL_SCOPE: &str = "https://mail.google.com/";

/// HTTPS connector used by both API hubs
pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// Gmail hub over rustls
pub type GmailHub = Gmail<HttpsConnector>;

/// Drive hub over rustls
pub type DriveApiHub = DriveHub<HttpsConnector>;

/// Named group of scopes with its own token cache file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ScopeSet {
    /// Full Drive access (list and delete files)
    Drive,
    /// Read-only Gmail access, used while planning
    GmailReadonly,
    /// Gmail modify access, enough to move messages to Trash
    GmailModify,
    /// Full mailbox access, needed for permanent deletion
    GmailFull,
}

impl ScopeSet {
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            ScopeSet::Drive => &[DRIVE_SCOPE],
            ScopeSet::GmailReadonly => &[GMAIL_READONLY_SCOPE],
            ScopeSet::GmailModify => &[GMAIL_MODIFY_SCOPE],
            ScopeSet::GmailFull => &[GMAIL_FULL_SCOPE],
        }
    }

    /// Scope passed to individual API calls so the hub never asks for a different grant
    pub fn primary_scope(&self) -> &'static str {
        self.scopes()[0]
    }

    pub fn token_file_name(&self) -> &'static str {
        match self {
            ScopeSet::Drive => "drive-token.json",
            ScopeSet::GmailReadonly => "gmail-readonly-token.json",
            ScopeSet::GmailModify => "gmail-modify-token.json",
            ScopeSet::GmailFull => "gmail-full-token.json",
        }
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeSet::Drive => "drive",
            ScopeSet::GmailReadonly => "gmail-readonly",
            ScopeSet::GmailModify => "gmail-modify",
            ScopeSet::GmailFull => "gmail-full",
        };
        f.write_str(name)
    }
}

/// Token bundle obtained for a scope set
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    pub granted_scopes: Vec<String>,
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map(|expiry| expiry <= now).unwrap_or(false)
    }

    /// An expired token can still be used as long as it can be refreshed
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) || self.refresh_token.is_some()
    }

    /// Token state as reported by the `auth` command
    pub fn status_at(&self, now: DateTime<Utc>) -> &'static str {
        if !self.is_expired_at(now) {
            "valid"
        } else if self.is_usable_at(now) {
            "expired, will be refreshed on next use"
        } else {
            "expired, re-authentication required"
        }
    }
}

fn mask(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}***", prefix)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &mask(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(mask))
            .field("expiry", &self.expiry)
            .field("granted_scopes", &self.granted_scopes)
            .finish()
    }
}

/// Entry of the token cache written by `persist_tokens_to_disk`
///
/// Only the fields we report on are read; the rest of the entry is ignored.
#[derive(Debug, Deserialize)]
struct StoredTokenEntry {
    #[serde(default)]
    scopes: Vec<String>,
    token: StoredToken,
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Look up the cached refresh token for `scopes` in a token cache file
pub async fn cached_refresh_token(path: &Path, scopes: &[&str]) -> Option<String> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    refresh_token_from_cache(&content, scopes)
}

fn refresh_token_from_cache(content: &str, scopes: &[&str]) -> Option<String> {
    let entries: Vec<StoredTokenEntry> = serde_json::from_str(content).ok()?;
    entries
        .into_iter()
        .find(|entry| scopes.iter().all(|s| entry.scopes.iter().any(|e| e == s)))
        .and_then(|entry| entry.token.refresh_token)
}

/// Obtains credentials for one scope set and builds API hubs from them
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    credentials_path: PathBuf,
    token_cache_path: PathBuf,
    scope_set: ScopeSet,
}

impl CredentialProvider {
    /// Provider whose token cache lives at `token_dir/<scope set file>`
    pub fn new(credentials_path: &Path, token_dir: &Path, scope_set: ScopeSet) -> Self {
        Self {
            credentials_path: credentials_path.to_path_buf(),
            token_cache_path: token_dir.join(scope_set.token_file_name()),
            scope_set,
        }
    }

    pub fn scope_set(&self) -> ScopeSet {
        self.scope_set
    }

    pub fn token_cache_path(&self) -> &Path {
        &self.token_cache_path
    }

    /// Drop the cached token so the next call runs the interactive flow
    pub async fn forget(&self) -> Result<bool> {
        if self.token_cache_path.exists() {
            tokio::fs::remove_file(&self.token_cache_path).await?;
            tracing::info!("Removed cached token {:?}", self.token_cache_path);
            return Ok(true);
        }
        Ok(false)
    }

    /// Return a valid credential, refreshing or running the browser flow as needed
    pub async fn obtain(&self) -> Result<Credential> {
        let (_auth, credential) = self.authorize().await?;
        Ok(credential)
    }

    /// Authenticated Drive hub plus the credential it was built from
    pub async fn drive_hub(&self) -> Result<(DriveApiHub, Credential)> {
        let (auth, credential) = self.authorize().await?;

        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(
                hyper_rustls::HttpsConnectorBuilder::new()
                    .with_native_roots()
                    .map_err(|e| {
                        CleanupError::AuthError(format!("Failed to load TLS roots: {}", e))
                    })?
                    .https_or_http()
                    .enable_http1()
                    .build(),
            );

        Ok((DriveHub::new(client, auth), credential))
    }

    /// Authenticated Gmail hub plus the credential it was built from
    pub async fn gmail_hub(&self) -> Result<(GmailHub, Credential)> {
        let (auth, credential) = self.authorize().await?;

        // HTTP/1 works better with the generated Google hubs
        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(
                hyper_rustls::HttpsConnectorBuilder::new()
                    .with_native_roots()
                    .map_err(|e| {
                        CleanupError::AuthError(format!("Failed to load TLS roots: {}", e))
                    })?
                    .https_or_http()
                    .enable_http1()
                    .build(),
            );

        Ok((Gmail::new(client, auth), credential))
    }

    async fn authorize(&self) -> Result<(impl GetToken + 'static, Credential)> {
        if let Some(parent) = self.token_cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let secret = yup_oauth2::read_application_secret(&self.credentials_path)
            .await
            .map_err(|e| {
                CleanupError::AuthError(format!(
                    "Failed to read client secret {:?}: {}",
                    self.credentials_path, e
                ))
            })?;

        // HTTPRedirect opens a browser and listens on a local port for the code
        let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(&self.token_cache_path)
        .build()
        .await
        .map_err(|e| CleanupError::AuthError(format!("Failed to build authenticator: {}", e)))?;

        // Fetching the token up front refreshes an expired one or runs the
        // interactive grant, and caches it under exactly these scopes.
        let scopes = self.scope_set.scopes();
        let token = auth
            .token(scopes)
            .await
            .map_err(|e| CleanupError::AuthError(format!("Failed to obtain token: {}", e)))?;

        let access_token = token
            .token()
            .ok_or_else(|| CleanupError::AuthError("Token response had no access token".to_string()))?
            .to_string();
        let expiry = token
            .expiration_time()
            .and_then(|t| DateTime::from_timestamp(t.unix_timestamp(), 0));

        secure_token_file(&self.token_cache_path).await?;

        let credential = Credential {
            access_token,
            refresh_token: cached_refresh_token(&self.token_cache_path, scopes).await,
            expiry,
            granted_scopes: scopes.iter().map(|s| s.to_string()).collect(),
        };
        tracing::debug!("Obtained {:?} for scope set {}", credential, self.scope_set);

        Ok((auth, credential))
    }
}

/// OAuth client description as downloaded from Google Cloud Console
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientSecretFile {
    #[serde(alias = "web")]
    pub installed: InstalledApp,
}

/// Installed application credentials (desktop/CLI app)
#[derive(Debug, Serialize, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Parse the client secret file, used to fail early with a readable message
pub async fn load_client_secret(path: &Path) -> Result<ClientSecretFile> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CleanupError::AuthError(format!("Failed to read client secret {:?}: {}", path, e))
    })?;
    let secret = serde_json::from_str(&content)?;
    Ok(secret)
}

/// Restrict the token file to its owner (0600)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if !path.exists() {
        return Ok(());
    }
    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows relies on the ACLs of the user profile directory
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
