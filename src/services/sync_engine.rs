//! Reconciliation between project checklists and tracking cards.
//!
//! A project card on Active carries checklists. Each check item is mirrored by a tracking
//! card with the same name: in To Do while the item is incomplete, in Done once complete,
//! and in Storage while the project is parked back on Projects. All state is re-read from
//! the board on every event; the engine itself keeps nothing but the resolved list ids and
//! the webhook registry.

use std::sync::Arc;

use crate::domain::{
    find_card, BoardLists, Card, CheckItem, CheckItemChange, CheckItemState, List, ListChange,
    ListName, ModelType, Result, WatcherError,
};
use crate::trello::BoardClient;

use super::project_locks::ProjectLocks;
use super::webhooks::WebhookManager;

/// What a card move between two of the board's lists means for the checklists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate,
    Deactivate,
    CompleteItem,
    ReopenItem,
}

impl Transition {
    pub fn between(before: Option<ListName>, after: Option<ListName>) -> Option<Self> {
        use ListName::*;
        match (before?, after?) {
            (Storage, _) | (_, Storage) => None,
            (Projects, Active) => Some(Transition::Activate),
            (Active, Projects) => Some(Transition::Deactivate),
            (ToDo, Done) => Some(Transition::CompleteItem),
            (Done, ToDo) => Some(Transition::ReopenItem),
            _ => None,
        }
    }
}

/// Counts of what one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub moved: usize,
    pub created: usize,
    pub skipped: usize,
}

/// Result of applying a check item change to the tracking cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSync {
    Moved,
    Created,
    AlreadyPlaced,
    Ignored,
}

pub struct SyncEngine {
    client: Arc<dyn BoardClient>,
    board: BoardLists,
    webhooks: Arc<WebhookManager>,
    locks: ProjectLocks,
}

impl SyncEngine {
    pub fn new(client: Arc<dyn BoardClient>, board: BoardLists, webhooks: Arc<WebhookManager>) -> Self {
        Self {
            client,
            board,
            webhooks,
            locks: ProjectLocks::new(),
        }
    }

    /// Resolves the board's five lists; a missing list is a configuration error.
    pub async fn connect(
        client: Arc<dyn BoardClient>,
        board_id: &str,
        webhooks: Arc<WebhookManager>,
    ) -> Result<Self> {
        let lists = client.board_lists(board_id).await?;
        let board = BoardLists::resolve(&lists)?;
        tracing::info!(board_id, lists = lists.len(), "Resolved board lists");
        Ok(Self::new(client, board, webhooks))
    }

    pub fn board(&self) -> &BoardLists {
        &self.board
    }

    pub fn webhooks(&self) -> &Arc<WebhookManager> {
        &self.webhooks
    }

    /// Registers the standing webhooks and catches up on anything that drifted while the
    /// watcher was offline.
    pub async fn startup(&self) -> Result<()> {
        self.webhooks
            .ensure_active(ModelType::List, &self.board.active.id)
            .await?;
        self.webhooks
            .ensure_active(ModelType::List, &self.board.done.id)
            .await?;

        let projects = self.client.list_cards(&self.board.active.id).await?;
        // Activation below switches each project's webhook on.
        for project in &projects {
            self.webhooks.ensure(ModelType::Card, &project.id).await?;
        }

        for project in &projects {
            let summary = self.activate_project(project).await?;
            tracing::info!(
                card_id = project.id,
                project = project.name,
                moved = summary.moved,
                created = summary.created,
                "Startup reconciliation complete"
            );
        }

        Ok(())
    }

    pub async fn handle_list_change(&self, change: &ListChange) -> Result<Option<Transition>> {
        let before = self.board.classify(change.before());
        let after = self.board.classify(change.after());
        tracing::debug!(
            card_id = change.card().id,
            before = change.before(),
            after = change.after(),
            "Handling list change"
        );

        let Some(transition) = Transition::between(before, after) else {
            return Ok(None);
        };

        let card = self.client.card(&change.card().id).await?;
        match transition {
            Transition::Activate => {
                self.activate_project(&card).await?;
            }
            Transition::Deactivate => {
                self.deactivate_project(&card).await?;
            }
            Transition::CompleteItem => {
                self.set_item_state(&card.name, CheckItemState::Complete)
                    .await?;
            }
            Transition::ReopenItem => {
                self.set_item_state(&card.name, CheckItemState::Incomplete)
                    .await?;
            }
        }

        Ok(Some(transition))
    }

    pub async fn handle_check_item_change(&self, change: &CheckItemChange) -> Result<ItemSync> {
        let name = change.item_name();
        tracing::info!(check_item = name, state = %change.state(), "Handling check item change");

        match change.state() {
            CheckItemState::Complete => {
                let card = self.find_in_list(&self.board.todo, name).await?;
                self.client.move_card(&card.id, &self.board.done.id).await?;
                Ok(ItemSync::Moved)
            }
            CheckItemState::Incomplete => match self.find_in_list(&self.board.done, name).await {
                Ok(card) => {
                    self.client.move_card(&card.id, &self.board.todo.id).await?;
                    Ok(ItemSync::Moved)
                }
                Err(err) if err.is_not_found() => {
                    match self.find_in_list(&self.board.todo, name).await {
                        Ok(_) => Ok(ItemSync::AlreadyPlaced),
                        Err(err) if err.is_not_found() => {
                            let card = self.client.create_card(&self.board.todo.id, name).await?;
                            tracing::info!(card_id = card.id, name, "Created tracking card");
                            Ok(ItemSync::Created)
                        }
                        Err(err) => Err(err),
                    }
                }
                Err(err) => Err(err),
            },
            CheckItemState::Unknown => Ok(ItemSync::Ignored),
        }
    }

    /// Brings a newly active project's tracking cards out of Storage, creating any that
    /// never existed. Safe to run repeatedly.
    pub async fn activate_project(&self, project: &Card) -> Result<ReconcileSummary> {
        let _guard = self.locks.lock(&project.id).await;

        let checklists = self.client.checklists(&project.id).await?;
        let mut storage = self.client.list_cards(&self.board.storage.id).await?;
        let mut todo = self.client.list_cards(&self.board.todo.id).await?;
        let mut done = self.client.list_cards(&self.board.done.id).await?;

        let summary = self
            .webhooks
            .suspended(&self.board.done.id, async {
                let mut summary = ReconcileSummary::default();

                for checklist in checklists.iter().filter(|checklist| !checklist.all_complete()) {
                    for item in &checklist.check_items {
                        let target = self.target_list(item);

                        if let Some(index) = storage.iter().position(|card| card.name == item.name) {
                            let mut card = storage.swap_remove(index);
                            self.client.move_card(&card.id, &target.id).await?;
                            card.list_id = target.id.clone();
                            summary.moved += 1;
                            if item.is_complete() {
                                done.push(card);
                            } else {
                                todo.push(card);
                            }
                        } else if find_card(&todo, &item.name).is_some()
                            || find_card(&done, &item.name).is_some()
                        {
                            summary.skipped += 1;
                        } else {
                            let card = self.client.create_card(&target.id, &item.name).await?;
                            summary.created += 1;
                            if item.is_complete() {
                                done.push(card);
                            } else {
                                todo.push(card);
                            }
                        }
                    }
                }

                Ok::<_, WatcherError>(summary)
            })
            .await?;

        self.webhooks
            .ensure_active(ModelType::Card, &project.id)
            .await?;

        tracing::info!(
            card_id = project.id,
            project = project.name,
            moved = summary.moved,
            created = summary.created,
            skipped = summary.skipped,
            "Activated project"
        );
        Ok(summary)
    }

    /// Parks a project's tracking cards in Storage and stops watching its card.
    pub async fn deactivate_project(&self, project: &Card) -> Result<ReconcileSummary> {
        let _guard = self.locks.lock(&project.id).await;

        let checklists = self.client.checklists(&project.id).await?;
        let mut tracked = self.client.list_cards(&self.board.todo.id).await?;
        tracked.extend(self.client.list_cards(&self.board.done.id).await?);

        let summary = self
            .webhooks
            .suspended(&self.board.done.id, async {
                let mut summary = ReconcileSummary::default();

                for item in checklists.iter().flat_map(|checklist| &checklist.check_items) {
                    // Missing cards are recreated if the project becomes active again.
                    let Some(index) = tracked.iter().position(|card| card.name == item.name) else {
                        summary.skipped += 1;
                        continue;
                    };
                    let card = tracked.swap_remove(index);
                    self.client
                        .move_card(&card.id, &self.board.storage.id)
                        .await?;
                    summary.moved += 1;
                }

                Ok::<_, WatcherError>(summary)
            })
            .await?;

        self.webhooks.deactivate(&project.id).await?;

        tracing::info!(
            card_id = project.id,
            project = project.name,
            moved = summary.moved,
            skipped = summary.skipped,
            "Deactivated project"
        );
        Ok(summary)
    }

    /// Finds the check item named `name` on any Active project card. The first match wins.
    pub async fn find_active_check_item(&self, name: &str) -> Result<(String, CheckItem)> {
        let projects = self.client.list_cards(&self.board.active.id).await?;
        for project in projects {
            let checklists = self.client.checklists(&project.id).await?;
            if let Some(item) = checklists.iter().find_map(|checklist| checklist.find_item(name)) {
                return Ok((project.id, item.clone()));
            }
        }

        Err(WatcherError::not_found("check item", name))
    }

    async fn set_item_state(&self, name: &str, state: CheckItemState) -> Result<()> {
        let (card_id, item) = self.find_active_check_item(name).await?;
        self.client
            .set_check_item_state(&card_id, &item.id, state)
            .await?;
        tracing::info!(card_id, check_item = name, state = %state, "Synced check item from card move");
        Ok(())
    }

    async fn find_in_list(&self, list: &List, name: &str) -> Result<Card> {
        let cards = self.client.list_cards(&list.id).await?;
        find_card(&cards, name)
            .cloned()
            .ok_or_else(|| WatcherError::not_found("card", format!("{} in {}", name, list.name)))
    }

    fn target_list(&self, item: &CheckItem) -> &List {
        if item.is_complete() {
            &self.board.done
        } else {
            &self.board.todo
        }
    }
}
