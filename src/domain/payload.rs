//! Webhook payload shapes and their classification.
//!
//! Trello posts the full action for every change on a watched model. The watcher only
//! acts on two of them: a card moving between lists, and a checklist item changing state.
//! Classification looks at `action.type` first and only then decodes the matching shape,
//! so a body can never be mistaken for the other kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::board::CheckItemState;

pub const UPDATE_CARD: &str = "updateCard";
pub const UPDATE_CHECK_ITEM_STATE: &str = "updateCheckItemStateOnCard";
pub const CREATE_CHECK_ITEM: &str = "createCheckItem";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub id: String,
    #[serde(default)]
    pub id_list: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OldValues {
    #[serde(default)]
    pub id_list: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChangeData {
    pub list_after: ModelRef,
    pub list_before: ModelRef,
    pub card: CardRef,
    #[serde(default)]
    pub old: OldValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChangeAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub data: ListChangeData,
}

/// A card moved from one list to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChange {
    #[serde(default)]
    pub model: ModelRef,
    pub action: ListChangeAction,
}

impl ListChange {
    pub fn card(&self) -> &CardRef {
        &self.action.data.card
    }

    pub fn before(&self) -> &str {
        &self.action.data.list_before.name
    }

    pub fn after(&self) -> &str {
        &self.action.data.list_after.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItemRef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub state: CheckItemState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItemChangeData {
    pub card: ModelRef,
    pub check_item: CheckItemRef,
    #[serde(default)]
    pub checklist: ModelRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItemChangeAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub data: CheckItemChangeData,
}

/// A checklist item was created or toggled on a project card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItemChange {
    #[serde(default)]
    pub model: ModelRef,
    pub action: CheckItemChangeAction,
}

impl CheckItemChange {
    pub fn item_name(&self) -> &str {
        &self.action.data.check_item.name
    }

    pub fn state(&self) -> CheckItemState {
        self.action.data.check_item.state
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookPayload {
    ListChange(ListChange),
    CheckItemChange(CheckItemChange),
    Unclassified,
}

impl WebhookPayload {
    pub fn classify(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return WebhookPayload::Unclassified;
        };

        let action_type = value
            .get("action")
            .and_then(|action| action.get("type"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        let decoded = match action_type.as_deref() {
            Some(UPDATE_CARD) => {
                serde_json::from_value::<ListChange>(value).map(WebhookPayload::ListChange)
            }
            Some(UPDATE_CHECK_ITEM_STATE) | Some(CREATE_CHECK_ITEM) => {
                serde_json::from_value::<CheckItemChange>(value)
                    .map(WebhookPayload::CheckItemChange)
            }
            _ => return WebhookPayload::Unclassified,
        };

        decoded.unwrap_or_else(|err| {
            tracing::debug!(action_type = ?action_type, error = %err, "Payload did not match its action shape");
            WebhookPayload::Unclassified
        })
    }
}
