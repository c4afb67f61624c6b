use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{Attachment, Board, BoardList, Card, CardComment, Config, Label};

const DEFAULT_API_URL: &str = "https://api.trello.com/1";

/// Error type for remote service calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("could not reach the board service: {0}")]
    Network(#[source] reqwest::Error),
    #[error("the board service rejected our credentials")]
    Unauthorized,
    #[error("request to {path} failed with HTTP {status}")]
    Api { status: u16, path: String },
    #[error("could not decode response from {path}: {source}")]
    Decode {
        path: String,
        source: reqwest::Error,
    },
    #[error("unexpected response shape from {path}: {source}")]
    Shape {
        path: String,
        source: serde_json::Error,
    },
}

/// Synchronous client for the remote board service.
///
/// One request is in flight at a time and nothing is retried; a transport
/// failure surfaces as `ApiError::Network` and ends the command.
pub struct ApiClient {
    http: Client,
    base: String,
    key: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<ApiClient, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("kard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ApiError::Network)?;
        Ok(ApiClient {
            http,
            base: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            key: config.api_key.clone(),
            token: config.api_token.clone(),
        })
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let url = format!("{}{}", self.base, path);
        let resp = self
            .http
            .request(method, &url)
            .query(&[("key", self.key.as_str()), ("token", self.token.as_str())])
            .query(query)
            .send()
            .map_err(ApiError::Network)?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            s if !s.is_success() => Err(ApiError::Api {
                status: s.as_u16(),
                path: path.to_string(),
            }),
            _ => Ok(resp),
        }
    }

    /// Perform a request and decode the JSON body.
    pub fn fetch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let resp = self.send(method, path, query)?;
        resp.json().map_err(|e| ApiError::Decode {
            path: path.to_string(),
            source: e,
        })
    }

    /// Perform a request and discard the body. Used for mutations where the
    /// response content is uninteresting (deletes in particular may return
    /// an empty body).
    fn execute(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<(), ApiError> {
        self.send(method, path, query).map(|_| ())
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let value = self.fetch(Method::GET, path, query)?;
        serde_json::from_value(value).map_err(|e| ApiError::Shape {
            path: path.to_string(),
            source: e,
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Boards on the account; `filter` is one of `open`, `closed`, `all`.
    pub fn boards(&self, filter: &str) -> Result<Vec<Board>, ApiError> {
        self.get("/members/me/boards", &[("filter", filter)])
    }

    /// All open boards on the account. Doubles as the credential check at
    /// session start.
    pub fn open_boards(&self) -> Result<Vec<Board>, ApiError> {
        self.boards("open")
    }

    /// Lists on a board; `filter` is one of `open`, `closed`, `all`.
    pub fn lists(&self, board_id: &str, filter: &str) -> Result<Vec<BoardList>, ApiError> {
        self.get(
            &format!("/boards/{board_id}/lists"),
            &[("cards", "none"), ("filter", filter)],
        )
    }

    pub fn labels(&self, board_id: &str) -> Result<Vec<Label>, ApiError> {
        self.get(&format!("/boards/{board_id}/labels"), &[("limit", "200")])
    }

    /// All cards on a board in the given status (`all|closed|open|visible`).
    pub fn board_cards(&self, board_id: &str, status: &str) -> Result<Vec<Card>, ApiError> {
        self.get(
            &format!("/boards/{board_id}/cards"),
            &[("filter", status), ("fields", "all")],
        )
    }

    /// All cards on one list in the given status.
    pub fn list_cards(&self, list_id: &str, status: &str) -> Result<Vec<Card>, ApiError> {
        self.get(
            &format!("/lists/{list_id}/cards"),
            &[("filter", status), ("fields", "all")],
        )
    }

    /// Re-fetch a single card after a mutation.
    pub fn card(&self, card_id: &str) -> Result<Card, ApiError> {
        self.get(&format!("/cards/{card_id}"), &[("fields", "all")])
    }

    pub fn card_attachments(&self, card_id: &str) -> Result<Vec<Attachment>, ApiError> {
        self.get(&format!("/cards/{card_id}/attachments"), &[])
    }

    /// Comments on a card, oldest first.
    pub fn card_comments(&self, card_id: &str) -> Result<Vec<CardComment>, ApiError> {
        let mut comments: Vec<CardComment> = self.get(
            &format!("/cards/{card_id}/actions"),
            &[("filter", "commentCard")],
        )?;
        comments.sort_by_key(|c| c.date);
        Ok(comments)
    }

    // -----------------------------------------------------------------------
    // Card mutations
    // -----------------------------------------------------------------------

    pub fn delete_card(&self, card_id: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("/cards/{card_id}"), &[])
    }

    /// Archive (`true`) or unarchive (`false`) a card.
    pub fn set_closed(&self, card_id: &str, closed: bool) -> Result<(), ApiError> {
        let value = if closed { "true" } else { "false" };
        self.execute(
            Method::PUT,
            &format!("/cards/{card_id}/closed"),
            &[("value", value)],
        )
    }

    pub fn set_name(&self, card_id: &str, name: &str) -> Result<(), ApiError> {
        self.execute(
            Method::PUT,
            &format!("/cards/{card_id}/name"),
            &[("value", name)],
        )
    }

    pub fn set_desc(&self, card_id: &str, desc: &str) -> Result<(), ApiError> {
        self.execute(
            Method::PUT,
            &format!("/cards/{card_id}/desc"),
            &[("value", desc)],
        )
    }

    pub fn set_due(&self, card_id: &str, due: DateTime<Utc>) -> Result<(), ApiError> {
        let value = due.to_rfc3339();
        self.execute(
            Method::PUT,
            &format!("/cards/{card_id}/due"),
            &[("value", value.as_str())],
        )
    }

    /// Move a card to another list on the same board.
    pub fn set_list(&self, card_id: &str, list_id: &str) -> Result<(), ApiError> {
        self.execute(
            Method::PUT,
            &format!("/cards/{card_id}/idList"),
            &[("value", list_id)],
        )
    }

    pub fn add_label(&self, card_id: &str, label_id: &str) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            &format!("/cards/{card_id}/idLabels"),
            &[("value", label_id)],
        )
    }

    pub fn remove_label(&self, card_id: &str, label_id: &str) -> Result<(), ApiError> {
        self.execute(
            Method::DELETE,
            &format!("/cards/{card_id}/idLabels/{label_id}"),
            &[],
        )
    }

    pub fn attach_url(&self, card_id: &str, url: &str) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            &format!("/cards/{card_id}/attachments"),
            &[("url", url)],
        )
    }

    pub fn remove_attachment(&self, card_id: &str, attachment_id: &str) -> Result<(), ApiError> {
        self.execute(
            Method::DELETE,
            &format!("/cards/{card_id}/attachments/{attachment_id}"),
            &[],
        )
    }

    pub fn comment(&self, card_id: &str, text: &str) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            &format!("/cards/{card_id}/actions/comments"),
            &[("text", text)],
        )
    }

    /// Create a card at the bottom of a list and return it.
    pub fn create_card(
        &self,
        list_id: &str,
        name: &str,
        desc: Option<&str>,
    ) -> Result<Card, ApiError> {
        let path = "/cards".to_string();
        let mut query = vec![("idList", list_id), ("name", name), ("pos", "bottom")];
        if let Some(desc) = desc {
            query.push(("desc", desc));
        }
        let value = self.fetch(Method::POST, &path, &query)?;
        serde_json::from_value(value).map_err(|e| ApiError::Shape { path, source: e })
    }

    /// Create a new list on the board.
    pub fn create_list(&self, board_id: &str, name: &str) -> Result<BoardList, ApiError> {
        let path = format!("/boards/{board_id}/lists");
        let value = self.fetch(Method::POST, &path, &[("name", name)])?;
        serde_json::from_value(value).map_err(|e| ApiError::Shape { path, source: e })
    }

    /// Create a new label on the board and return it.
    pub fn create_label(
        &self,
        board_id: &str,
        name: &str,
        color: &str,
    ) -> Result<Label, ApiError> {
        let path = format!("/boards/{board_id}/labels");
        let value = self.fetch(Method::POST, &path, &[("name", name), ("color", color)])?;
        serde_json::from_value(value).map_err(|e| ApiError::Shape { path, source: e })
    }
}
