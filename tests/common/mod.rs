#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use trello_watcher::domain::{
    Card, CheckItem, CheckItemChange, CheckItemState, Checklist, List, ListChange, Result,
    WatcherError, Webhook,
};
use trello_watcher::services::{PayloadRecorder, SyncEngine, WebhookManager};
use trello_watcher::trello::BoardClient;

pub const BOARD_ID: &str = "board-1";
pub const PROJECTS: &str = "l-projects";
pub const ACTIVE: &str = "l-active";
pub const TODO: &str = "l-todo";
pub const DONE: &str = "l-done";
pub const STORAGE: &str = "l-storage";
pub const CALLBACK_HOST: &str = "watcher.test";

/// A side effect the engine asked the board service to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Move { name: String, to: String },
    Create { name: String, list: String },
    SetCheckItem { name: String, state: CheckItemState },
    CreateWebhook { model_id: String, callback_url: String },
    ToggleWebhook { model_id: String, active: bool },
}

#[derive(Default)]
struct BoardState {
    lists: Vec<List>,
    cards: Vec<Card>,
    checklists: Vec<Checklist>,
    webhooks: Vec<Webhook>,
    ops: Vec<Op>,
    next_id: u64,
    fail_on: Option<&'static str>,
    yield_on_write: bool,
}

impl BoardState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn check_failure(&self, operation: &'static str) -> Result<()> {
        if self.fail_on == Some(operation) {
            return Err(WatcherError::RemoteService(format!("{} failed", operation)));
        }
        Ok(())
    }
}

/// An in-process board with the five standard lists plus an unrelated one.
pub struct InMemoryBoard {
    state: Mutex<BoardState>,
}

impl InMemoryBoard {
    pub fn standard() -> Arc<Self> {
        let list = |id: &str, name: &str| List {
            id: id.into(),
            name: name.into(),
        };
        let state = BoardState {
            lists: vec![
                list("l-ideas", "Ideas"),
                list(PROJECTS, "Projects"),
                list(ACTIVE, "Active"),
                list(TODO, "To Do"),
                list(DONE, "Done"),
                list(STORAGE, "Storage"),
            ],
            ..BoardState::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn add_card(&self, list_id: &str, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("card");
        state.cards.push(Card {
            id: id.clone(),
            name: name.into(),
            list_id: list_id.into(),
        });
        id
    }

    pub fn add_checklist(&self, card_id: &str, items: &[(&str, CheckItemState)]) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("checklist");
        let mut check_items = Vec::new();
        for (name, item_state) in items {
            let item_id = state.next_id("item");
            check_items.push(CheckItem {
                id: item_id,
                name: (*name).into(),
                state: *item_state,
            });
        }
        state.checklists.push(Checklist {
            id: id.clone(),
            name: "Tasks".into(),
            card_id: card_id.into(),
            check_items,
        });
        id
    }

    pub fn add_webhook(&self, model_id: &str, active: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("webhook");
        state.webhooks.push(Webhook {
            id: id.clone(),
            description: String::new(),
            model_id: model_id.into(),
            callback_url: format!("https://{}/list/{}", CALLBACK_HOST, model_id),
            active,
        });
        id
    }

    pub fn remove_card(&self, card_id: &str) {
        self.state.lock().unwrap().cards.retain(|card| card.id != card_id);
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_on = Some(operation);
    }

    /// Makes every card move and creation yield to the scheduler first, so concurrent
    /// operations interleave the way remote round trips would.
    pub fn yield_on_write(&self) {
        self.state.lock().unwrap().yield_on_write = true;
    }

    async fn pause_before_write(&self) {
        let yielding = self.state.lock().unwrap().yield_on_write;
        if yielding {
            tokio::task::yield_now().await;
        }
    }

    /// Toggles of one model's webhook, in order.
    pub fn toggles(&self, model_id: &str) -> Vec<bool> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::ToggleWebhook { model_id: id, active } if id == model_id => Some(active),
                _ => None,
            })
            .collect()
    }

    /// Sorted card names currently in a list.
    pub fn names_in(&self, list_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .cards
            .iter()
            .filter(|card| card.list_id == list_id)
            .map(|card| card.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn item_state(&self, name: &str) -> Option<CheckItemState> {
        let state = self.state.lock().unwrap();
        state
            .checklists
            .iter()
            .flat_map(|checklist| &checklist.check_items)
            .find(|item| item.name == name)
            .map(|item| item.state)
    }

    pub fn webhook_active(&self, model_id: &str) -> Option<bool> {
        let state = self.state.lock().unwrap();
        state
            .webhooks
            .iter()
            .find(|hook| hook.model_id == model_id)
            .map(|hook| hook.active)
    }

    pub fn webhook_count(&self, model_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .webhooks
            .iter()
            .filter(|hook| hook.model_id == model_id)
            .count()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Only card moves and creations, the operations that change list membership.
    pub fn card_ops(&self) -> Vec<Op> {
        self.ops()
            .into_iter()
            .filter(|op| matches!(op, Op::Move { .. } | Op::Create { .. }))
            .collect()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }
}

#[async_trait]
impl BoardClient for InMemoryBoard {
    async fn board_lists(&self, board_id: &str) -> Result<Vec<List>> {
        let state = self.state.lock().unwrap();
        state.check_failure("board_lists")?;
        if board_id != BOARD_ID {
            return Err(WatcherError::not_found("board", board_id));
        }
        Ok(state.lists.clone())
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        let state = self.state.lock().unwrap();
        state.check_failure("list_cards")?;
        Ok(state
            .cards
            .iter()
            .filter(|card| card.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn card(&self, card_id: &str) -> Result<Card> {
        let state = self.state.lock().unwrap();
        state
            .cards
            .iter()
            .find(|card| card.id == card_id)
            .cloned()
            .ok_or_else(|| WatcherError::not_found("card", card_id))
    }

    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        let state = self.state.lock().unwrap();
        state.check_failure("checklists")?;
        Ok(state
            .checklists
            .iter()
            .filter(|checklist| checklist.card_id == card_id)
            .cloned()
            .collect())
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()> {
        self.pause_before_write().await;
        let mut state = self.state.lock().unwrap();
        state.check_failure("move_card")?;
        let card = state
            .cards
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or_else(|| WatcherError::not_found("card", card_id))?;
        card.list_id = list_id.into();
        let name = card.name.clone();
        state.ops.push(Op::Move {
            name,
            to: list_id.into(),
        });
        Ok(())
    }

    async fn create_card(&self, list_id: &str, name: &str) -> Result<Card> {
        self.pause_before_write().await;
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_card")?;
        let card = Card {
            id: state.next_id("card"),
            name: name.into(),
            list_id: list_id.into(),
        };
        state.cards.push(card.clone());
        state.ops.push(Op::Create {
            name: name.into(),
            list: list_id.into(),
        });
        Ok(card)
    }

    async fn set_check_item_state(
        &self,
        card_id: &str,
        check_item_id: &str,
        item_state: CheckItemState,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("set_check_item_state")?;
        let item = state
            .checklists
            .iter_mut()
            .filter(|checklist| checklist.card_id == card_id)
            .flat_map(|checklist| checklist.check_items.iter_mut())
            .find(|item| item.id == check_item_id)
            .ok_or_else(|| WatcherError::not_found("check item", check_item_id))?;
        item.state = item_state;
        let name = item.name.clone();
        state.ops.push(Op::SetCheckItem {
            name,
            state: item_state,
        });
        Ok(())
    }

    async fn webhooks(&self) -> Result<Vec<Webhook>> {
        let state = self.state.lock().unwrap();
        state.check_failure("webhooks")?;
        Ok(state.webhooks.clone())
    }

    async fn create_webhook(
        &self,
        description: &str,
        callback_url: &str,
        model_id: &str,
    ) -> Result<Webhook> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_webhook")?;
        let webhook = Webhook {
            id: state.next_id("webhook"),
            description: description.into(),
            model_id: model_id.into(),
            callback_url: callback_url.into(),
            active: true,
        };
        state.webhooks.push(webhook.clone());
        state.ops.push(Op::CreateWebhook {
            model_id: model_id.into(),
            callback_url: callback_url.into(),
        });
        Ok(webhook)
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("set_webhook_active")?;
        let hook = state
            .webhooks
            .iter_mut()
            .find(|hook| hook.id == webhook_id)
            .ok_or_else(|| WatcherError::not_found("webhook", webhook_id))?;
        hook.active = active;
        let model_id = hook.model_id.clone();
        state.ops.push(Op::ToggleWebhook { model_id, active });
        Ok(())
    }
}

/// Keeps recorded payloads and verified paths in memory.
#[derive(Default)]
pub struct MemoryRecorder {
    pub unhandled: Mutex<Vec<(String, String, Vec<u8>)>>,
    pub verified: Mutex<Vec<String>>,
}

#[async_trait]
impl PayloadRecorder for MemoryRecorder {
    async fn record_unhandled(&self, obj_type: &str, obj_id: &str, body: &[u8]) -> Result<()> {
        self.unhandled
            .lock()
            .unwrap()
            .push((obj_type.into(), obj_id.into(), body.to_vec()));
        Ok(())
    }

    async fn mark_verified(&self, path: &str) -> Result<()> {
        self.verified.lock().unwrap().push(path.into());
        Ok(())
    }
}

pub async fn webhook_manager(board: &Arc<InMemoryBoard>) -> Arc<WebhookManager> {
    let client: Arc<dyn BoardClient> = board.clone();
    Arc::new(
        WebhookManager::load(client, "https", CALLBACK_HOST)
            .await
            .expect("Failed to load webhooks"),
    )
}

pub async fn engine(board: &Arc<InMemoryBoard>) -> SyncEngine {
    let webhooks = webhook_manager(board).await;
    let client: Arc<dyn BoardClient> = board.clone();
    SyncEngine::connect(client, BOARD_ID, webhooks)
        .await
        .expect("Failed to connect engine")
}

impl InMemoryBoard {
    /// The board's current view of a card.
    pub fn card_by_id(&self, card_id: &str) -> Card {
        let state = self.state.lock().unwrap();
        state
            .cards
            .iter()
            .find(|card| card.id == card_id)
            .cloned()
            .expect("No such card")
    }
}

pub fn list_change_body(card_id: &str, card_name: &str, before: &str, after: &str) -> String {
    json!({
        "model": {"id": "l-model", "name": after},
        "action": {
            "type": "updateCard",
            "data": {
                "listAfter": {"id": "l-after", "name": after},
                "listBefore": {"id": "l-before", "name": before},
                "card": {"id": card_id, "idList": "l-after", "name": card_name},
                "old": {"idList": "l-before"}
            }
        }
    })
    .to_string()
}

pub fn check_item_body(item_name: &str, state: &str) -> String {
    json!({
        "model": {"id": "c-proj", "name": "Proj"},
        "action": {
            "type": "updateCheckItemStateOnCard",
            "data": {
                "card": {"id": "c-proj", "name": "Proj"},
                "checkItem": {"id": "ci-1", "name": item_name, "state": state},
                "checklist": {"id": "cl-1", "name": "Tasks"}
            }
        }
    })
    .to_string()
}

pub fn list_change(card_id: &str, card_name: &str, before: &str, after: &str) -> ListChange {
    serde_json::from_str(&list_change_body(card_id, card_name, before, after))
        .expect("Failed to build list change")
}

pub fn check_item_change(item_name: &str, state: &str) -> CheckItemChange {
    serde_json::from_str(&check_item_body(item_name, state))
        .expect("Failed to build check item change")
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}
