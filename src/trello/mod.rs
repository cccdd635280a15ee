pub mod client;

use async_trait::async_trait;

use crate::domain::{Card, CheckItemState, Checklist, List, Result, Webhook};

pub use client::TrelloClient;

/// The narrow slice of the board service the watcher depends on.
#[async_trait]
pub trait BoardClient: Send + Sync {
    async fn board_lists(&self, board_id: &str) -> Result<Vec<List>>;

    async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>>;

    async fn card(&self, card_id: &str) -> Result<Card>;

    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>>;

    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<()>;

    async fn create_card(&self, list_id: &str, name: &str) -> Result<Card>;

    async fn set_check_item_state(
        &self,
        card_id: &str,
        check_item_id: &str,
        state: CheckItemState,
    ) -> Result<()>;

    /// Every webhook registered for the API token, across all boards.
    async fn webhooks(&self) -> Result<Vec<Webhook>>;

    async fn create_webhook(
        &self,
        description: &str,
        callback_url: &str,
        model_id: &str,
    ) -> Result<Webhook>;

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<()>;
}
