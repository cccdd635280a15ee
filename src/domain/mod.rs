pub mod board;
pub mod error;
pub mod payload;

pub use board::{
    find_card, BoardLists, Card, CheckItem, CheckItemState, Checklist, List, ListName,
    ModelType, Webhook,
};
pub use error::{Result, WatcherError};
pub use payload::{CheckItemChange, ListChange, WebhookPayload};
