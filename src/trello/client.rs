use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::{Card, CheckItemState, Checklist, List, Result, WatcherError, Webhook};

use super::BoardClient;

pub const DEFAULT_API_URL: &str = "https://api.trello.com/1";

/// `BoardClient` over the Trello REST API, authenticated with key/token query parameters.
#[derive(Clone)]
pub struct TrelloClient {
    http_client: reqwest::Client,
    api_url: String,
    key: String,
    token: String,
}

impl std::fmt::Debug for TrelloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TrelloClient {
    pub fn new(http_client: reqwest::Client, api_url: String, key: String, token: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            key,
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.api_url, path))
            .query(&[("key", self.key.as_str()), ("token", self.token.as_str())])
    }

    async fn send(&self, kind: &'static str, id: &str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(WatcherError::not_found(kind, id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(kind, id, status = %status, body = %body, "Board service returned non-success status");
            return Err(WatcherError::RemoteService(format!(
                "{} {} returned {}",
                kind, id, status
            )));
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        id: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(kind, id, request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl BoardClient for TrelloClient {
    async fn board_lists(&self, board_id: &str) -> Result<Vec<List>> {
        let request = self
            .request(Method::GET, &format!("/boards/{}/lists", board_id))
            .query(&[("fields", "id,name")]);
        self.fetch("board", board_id, request).await
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        let request = self
            .request(Method::GET, &format!("/lists/{}/cards", list_id))
            .query(&[("fields", "id,name,idList")]);
        self.fetch("list", list_id, request).await
    }

    async fn card(&self, card_id: &str) -> Result<Card> {
        let request = self
            .request(Method::GET, &format!("/cards/{}", card_id))
            .query(&[("fields", "id,name,idList")]);
        self.fetch("card", card_id, request).await
    }

    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        let request = self.request(Method::GET, &format!("/cards/{}/checklists", card_id));
        self.fetch("card", card_id, request).await
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("/cards/{}", card_id))
            .query(&[("idList", list_id)]);
        self.send("card", card_id, request).await?;
        Ok(())
    }

    async fn create_card(&self, list_id: &str, name: &str) -> Result<Card> {
        let request = self
            .request(Method::POST, "/cards")
            .query(&[("idList", list_id), ("name", name), ("desc", "")]);
        self.fetch("list", list_id, request).await
    }

    async fn set_check_item_state(
        &self,
        card_id: &str,
        check_item_id: &str,
        state: CheckItemState,
    ) -> Result<()> {
        let request = self
            .request(
                Method::PUT,
                &format!("/cards/{}/checkItem/{}", card_id, check_item_id),
            )
            .query(&[("state", state.as_str())]);
        self.send("check item", check_item_id, request).await?;
        Ok(())
    }

    async fn webhooks(&self) -> Result<Vec<Webhook>> {
        let request = self.request(Method::GET, &format!("/tokens/{}/webhooks", self.token));
        self.fetch("token", "webhooks", request).await
    }

    async fn create_webhook(
        &self,
        description: &str,
        callback_url: &str,
        model_id: &str,
    ) -> Result<Webhook> {
        let request = self.request(Method::POST, "/webhooks").query(&[
            ("description", description),
            ("callbackURL", callback_url),
            ("idModel", model_id),
        ]);
        self.fetch("model", model_id, request).await
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("/webhooks/{}", webhook_id))
            .query(&[("active", if active { "true" } else { "false" })]);
        self.send("webhook", webhook_id, request).await?;
        Ok(())
    }
}
