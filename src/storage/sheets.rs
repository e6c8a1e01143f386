//! Google Sheets ledger.
//!
//! Talks to the Sheets v4 REST API with `reqwest`, authorizing each request
//! with a bearer token minted from a service-account key.
//!
//! | Operation    | Request                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `list_tabs`  | `GET  spreadsheets/{id}?fields=sheets.properties.title`   |
//! | `create_tab` | `POST spreadsheets/{id}:batchUpdate` (`addSheet`)          |
//! | `set_header` | `PUT  spreadsheets/{id}/values/'{tab}'!A1`                 |
//! | `first_row`  | `GET  spreadsheets/{id}/values/'{tab}'!1:1`                |
//! | `append_rows`| `POST spreadsheets/{id}/values/'{tab}'!A1:append`          |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;
use yup_oauth2::ServiceAccountKey;
use yup_oauth2::authenticator::DefaultAuthenticator;

use crate::error::WriteFailure;
use crate::storage::{LedgerSink, WriteResult};
use crate::utils::join_segments;

/// Sheets v4 API root.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// OAuth scope for reading and writing spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Supplies bearer tokens for Sheets requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> WriteResult<String>;
}

#[async_trait]
impl TokenSource for DefaultAuthenticator {
    async fn access_token(&self) -> WriteResult<String> {
        let token = self.token(&[SHEETS_SCOPE]).await.map_err(|e| match e {
            yup_oauth2::Error::HttpError(_) | yup_oauth2::Error::LowLevelError(_) => {
                WriteFailure::transient(format!("token request failed: {e}"))
            }
            _ => WriteFailure::auth(format!("token request rejected: {e}")),
        })?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| WriteFailure::auth("token response carried no access token"))
    }
}

/// Google Sheets ledger backend.
pub struct SheetsLedger {
    client: Client,
    tokens: Box<dyn TokenSource>,
    api_base: String,
}

impl SheetsLedger {
    /// Authenticate with a service-account key.
    pub async fn connect(key: ServiceAccountKey, client: Client) -> WriteResult<Self> {
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| WriteFailure::auth(format!("service account unusable: {e}")))?;
        Ok(Self::with_tokens(client, Box::new(auth), SHEETS_API_BASE))
    }

    pub fn with_tokens(
        client: Client,
        tokens: Box<dyn TokenSource>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            api_base: api_base.into(),
        }
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> WriteResult<Url> {
        join_segments(&self.api_base, segments)
            .map_err(|e| WriteFailure::unknown(format!("bad Sheets URL: {e}")))
    }

    /// Tab name quoted for A1 notation.
    fn quoted(tab: &str) -> String {
        format!("'{}'", tab.replace('\'', "''"))
    }

    /// A1 range anchored at the tab's first cell.
    fn anchor(tab: &str) -> String {
        format!("{}!A1", Self::quoted(tab))
    }

    /// Send an authorized request and decode the JSON answer.
    async fn send(&self, context: &str, request: RequestBuilder) -> WriteResult<Value> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| WriteFailure::from_reqwest(context, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WriteFailure::from_reqwest(context, &e))?;

        if !status.is_success() {
            return Err(WriteFailure::new(
                crate::error::WriteCategory::from_http_status(status.as_u16()),
                format!("{context}: HTTP {}: {}", status.as_u16(), api_message(&body)),
            ));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| WriteFailure::unknown(format!("{context}: unreadable response: {e}")))
    }
}

/// Pull `error.message` out of a Google API error body.
fn api_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: ApiError,
    }
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: usize,
}

#[async_trait]
impl LedgerSink for SheetsLedger {
    async fn list_tabs(&self, ledger_id: &str) -> WriteResult<Vec<String>> {
        let mut url = self.url(["spreadsheets", ledger_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let body = self.send("list tabs", self.client.get(url)).await?;
        let spreadsheet: Spreadsheet = serde_json::from_value(body)
            .map_err(|e| WriteFailure::unknown(format!("list tabs: unexpected shape: {e}")))?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn create_tab(&self, ledger_id: &str, tab: &str) -> WriteResult<()> {
        let segment = format!("{ledger_id}:batchUpdate");
        let url = self.url(["spreadsheets", segment.as_str()])?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": tab } } }]
        });

        self.send("create tab", self.client.post(url).json(&body))
            .await?;
        Ok(())
    }

    async fn set_header(&self, ledger_id: &str, tab: &str, header: &[Value]) -> WriteResult<()> {
        let range = Self::anchor(tab);
        let mut url = self.url(["spreadsheets", ledger_id, "values", range.as_str()])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [header],
        });

        self.send("set header", self.client.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn first_row(&self, ledger_id: &str, tab: &str) -> WriteResult<Option<Vec<Value>>> {
        let range = format!("{}!1:1", Self::quoted(tab));
        let url = self.url(["spreadsheets", ledger_id, "values", range.as_str()])?;

        let body = self.send("read header", self.client.get(url)).await?;
        let range: ValueRange = serde_json::from_value(body)
            .map_err(|e| WriteFailure::unknown(format!("read header: unexpected shape: {e}")))?;

        Ok(range.values.into_iter().next().filter(|row| !row.is_empty()))
    }

    async fn append_rows(
        &self,
        ledger_id: &str,
        tab: &str,
        rows: &[Vec<Value>],
    ) -> WriteResult<usize> {
        let segment = format!("{}:append", Self::anchor(tab));
        let mut url = self.url(["spreadsheets", ledger_id, "values", segment.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .send("append rows", self.client.post(url).json(&body))
            .await?;
        let response: AppendResponse = serde_json::from_value(response)
            .map_err(|e| WriteFailure::unknown(format!("append rows: unexpected shape: {e}")))?;

        Ok(response.updates.map_or(0, |u| u.updated_rows))
    }

    fn describe(&self) -> &'static str {
        "sheets"
    }
}
