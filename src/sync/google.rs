//! # Google Implementations
//!
//! `GoogleAuthProvider` implements the OAuth installed-app flow with a
//! loopback redirect: tokens are cached in a JSON file next to the data
//! documents, refreshed silently while a refresh token works, and only
//! when both fail does the browser flow run again.
//!
//! `GoogleTabularStore` maps the `TabularStore` trait onto the Sheets v4
//! and Drive v3 REST APIs using batch endpoints, so a full sync is a
//! handful of round trips regardless of data size.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::sync::traits::{AuthProvider, RangeUpdate, TabularStore};

pub const OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const OAUTH_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Spreadsheet access plus per-file Drive access for the documents we
/// create; nothing broader
pub const OAUTH_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.file";

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";

/// Tokens expiring within this window count as expired, so a request
/// never starts with a token about to die mid-flight
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

const AUTH_RESPONSE_HTML: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h2>Authorization complete</h2><p>You can close this tab and return to the app.</p></body></html>";

/// Cached OAuth token as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    /// Unix seconds when `access_token` expires
    expires_at: i64,
}

impl StoredToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + TOKEN_EXPIRY_SKEW_SECS
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// OAuth provider for a Google "desktop app" client
pub struct GoogleAuthProvider {
    client_id: String,
    client_secret: String,
    token_path: PathBuf,
    http: reqwest::Client,
}

impl GoogleAuthProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_path: PathBuf,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_path,
            http: reqwest::Client::new(),
        }
    }

    fn load_cached_token(&self) -> Option<StoredToken> {
        let content = fs::read_to_string(&self.token_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn save_token(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json_content = serde_json::to_string_pretty(token)?;

        let temp_path = self.token_path.with_extension("tmp");
        fs::write(&temp_path, json_content)?;
        fs::rename(&temp_path, &self.token_path)?;

        debug!("Saved token cache to {:?}", self.token_path);
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)?;
        }
        Ok(())
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<StoredToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(OAUTH_TOKEN_URL).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Token refresh failed: {}", response.status()));
        }

        let payload: TokenResponse = response.json().await?;
        Ok(StoredToken {
            access_token: payload.access_token,
            // Google omits the refresh token on refresh grants; keep ours
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Utc::now().timestamp() + payload.expires_in,
        })
    }

    /// Full browser flow: listen on a loopback port, send the user to the
    /// consent page, catch the redirect and exchange the code
    async fn interactive_flow(&self) -> Result<StoredToken> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());

        let auth_url = reqwest::Url::parse_with_params(
            OAUTH_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;
        info!("🔑 AUTH: Open this URL in your browser to sign in:\n{}", auth_url);

        let (mut stream, _) = listener.accept().await?;
        let mut buffer = vec![0u8; 4096];
        let read = stream.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..read]).to_string();

        // Answer the browser whatever happens next
        let _ = stream.write_all(AUTH_RESPONSE_HTML.as_bytes()).await;

        let code = extract_auth_code(&request)
            .ok_or_else(|| anyhow::anyhow!("Authorization was denied or the redirect was malformed"))?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let response = self.http.post(OAUTH_TOKEN_URL).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Authorization code exchange failed: {}",
                response.status()
            ));
        }

        let payload: TokenResponse = response.json().await?;
        info!("✅ AUTH: Signed in to Google");
        Ok(StoredToken {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at: Utc::now().timestamp() + payload.expires_in,
        })
    }
}

#[async_trait]
impl AuthProvider for GoogleAuthProvider {
    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = self.load_cached_token() {
            if cached.is_fresh(Utc::now().timestamp()) {
                return Ok(cached.access_token);
            }
            if let Some(refresh_token) = cached.refresh_token {
                match self.refresh_access_token(&refresh_token).await {
                    Ok(token) => {
                        self.save_token(&token)?;
                        return Ok(token.access_token);
                    }
                    Err(e) => {
                        warn!("⚠️ AUTH: Refresh failed, falling back to browser flow: {}", e)
                    }
                }
            }
        }

        let token = self.interactive_flow().await?;
        self.save_token(&token)?;
        Ok(token.access_token)
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(cached) = self.load_cached_token() {
            let target = cached.refresh_token.unwrap_or(cached.access_token);
            let revoke = self
                .http
                .post(OAUTH_REVOKE_URL)
                .form(&[("token", target.as_str())])
                .send()
                .await;
            match revoke {
                Ok(response) if !response.status().is_success() => {
                    warn!("⚠️ AUTH: Remote revoke returned {}", response.status())
                }
                Err(e) => warn!("⚠️ AUTH: Could not revoke token remotely: {}", e),
                _ => {}
            }
        }

        self.clear_token()?;
        info!("Signed out of Google account");
        Ok(())
    }
}

/// Authorization code from the loopback redirect request, if present
fn extract_auth_code(request: &str) -> Option<String> {
    let line = request.lines().next()?;
    let path = line.strip_prefix("GET ")?.split_whitespace().next()?;
    let url = reqwest::Url::parse(&format!("http://127.0.0.1{}", path)).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}

/// Drive search expression for our spreadsheet by exact name
fn drive_search_query(name: &str) -> String {
    format!(
        "name='{}' and mimeType='application/vnd.google-apps.spreadsheet' and trashed=false",
        name.replace('\'', "\\'")
    )
}

// === Sheets / Drive wire types ===

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Serialize)]
struct SheetTitleProperties<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct NewSheet<'a> {
    properties: SheetTitleProperties<'a>,
}

#[derive(Serialize)]
struct NewSpreadsheet<'a> {
    properties: SheetTitleProperties<'a>,
    sheets: Vec<NewSheet<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetTabs {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetEntryProperties,
}

#[derive(Debug, Deserialize)]
struct SheetEntryProperties {
    title: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddSheetRequest<'a> {
    add_sheet: NewSheet<'a>,
}

#[derive(Serialize)]
struct SchemaBatchUpdate<'a> {
    requests: Vec<AddSheetRequest<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValuesBatchUpdate<'a> {
    value_input_option: &'a str,
    data: Vec<ValueRangeBody<'a>>,
}

#[derive(Serialize)]
struct ValueRangeBody<'a> {
    range: &'a str,
    values: &'a [Vec<String>],
}

#[derive(Serialize)]
struct ValuesBatchClear<'a> {
    ranges: &'a [String],
}

/// Sheets v4 / Drive v3 backed tabular store
pub struct GoogleTabularStore {
    http: reqwest::Client,
}

impl GoogleTabularStore {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(anyhow::anyhow!(
            "Google API error while {}: {} {}",
            action,
            status,
            body
        ))
    }
}

impl Default for GoogleTabularStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabularStore for GoogleTabularStore {
    async fn find_document(&self, token: &str, name: &str) -> Result<Option<String>> {
        let query = drive_search_query(name);
        let response = self
            .http
            .get(DRIVE_FILES_API)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("spaces", "drive"),
            ])
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::check_status(response, "searching Drive").await?;

        let payload: DriveFileList = response.json().await?;
        Ok(payload.files.into_iter().next().map(|file| file.id))
    }

    async fn document_exists(&self, token: &str, document_id: &str) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/{}", SHEETS_API, document_id))
            .query(&[("fields", "spreadsheetId")])
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check_status(response, "checking spreadsheet").await?;
        Ok(true)
    }

    async fn create_document(&self, token: &str, name: &str, tabs: &[String]) -> Result<String> {
        let body = NewSpreadsheet {
            properties: SheetTitleProperties { title: name },
            sheets: tabs
                .iter()
                .map(|tab| NewSheet {
                    properties: SheetTitleProperties { title: tab },
                })
                .collect(),
        };

        let response = self
            .http
            .post(SHEETS_API)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response, "creating spreadsheet").await?;

        let payload: CreatedSpreadsheet = response.json().await?;
        Ok(payload.spreadsheet_id)
    }

    async fn list_tabs(&self, token: &str, document_id: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/{}", SHEETS_API, document_id))
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::check_status(response, "listing tabs").await?;

        let payload: SpreadsheetTabs = response.json().await?;
        Ok(payload
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn add_tabs(&self, token: &str, document_id: &str, tabs: &[String]) -> Result<()> {
        let body = SchemaBatchUpdate {
            requests: tabs
                .iter()
                .map(|tab| AddSheetRequest {
                    add_sheet: NewSheet {
                        properties: SheetTitleProperties { title: tab },
                    },
                })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/{}:batchUpdate", SHEETS_API, document_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response, "adding tabs").await?;
        Ok(())
    }

    async fn batch_get(
        &self,
        token: &str,
        document_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Vec<Vec<String>>>> {
        let mut query: Vec<(&str, &str)> =
            ranges.iter().map(|range| ("ranges", range.as_str())).collect();
        query.push(("majorDimension", "ROWS"));

        let response = self
            .http
            .get(format!("{}/{}/values:batchGet", SHEETS_API, document_id))
            .query(&query)
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::check_status(response, "reading values").await?;

        let payload: BatchGetResponse = response.json().await?;
        Ok(payload
            .value_ranges
            .into_iter()
            .map(|value_range| value_range.values)
            .collect())
    }

    async fn batch_update(
        &self,
        token: &str,
        document_id: &str,
        updates: &[RangeUpdate],
    ) -> Result<()> {
        let body = ValuesBatchUpdate {
            value_input_option: "RAW",
            data: updates
                .iter()
                .map(|update| ValueRangeBody {
                    range: &update.range,
                    values: &update.values,
                })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/{}/values:batchUpdate", SHEETS_API, document_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response, "writing values").await?;
        Ok(())
    }

    async fn batch_clear(&self, token: &str, document_id: &str, ranges: &[String]) -> Result<()> {
        let body = ValuesBatchClear { ranges };

        let response = self
            .http
            .post(format!("{}/{}/values:batchClear", SHEETS_API, document_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response, "clearing values").await?;
        Ok(())
    }
}
