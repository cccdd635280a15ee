use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{Result, WatcherError};

/// The five lists the watcher understands. Any other list on the board is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListName {
    Projects,
    Active,
    ToDo,
    Done,
    Storage,
}

impl ListName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListName::Projects => "Projects",
            ListName::Active => "Active",
            ListName::ToDo => "To Do",
            ListName::Done => "Done",
            ListName::Storage => "Storage",
        }
    }

    pub fn all() -> &'static [ListName] {
        &[
            ListName::Projects,
            ListName::Active,
            ListName::ToDo,
            ListName::Done,
            ListName::Storage,
        ]
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ListName::all()
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown list: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(rename = "idList")]
    pub list_id: String,
}

/// Exact, case-sensitive name lookup. The first match wins.
pub fn find_card<'a>(cards: &'a [Card], name: &str) -> Option<&'a Card> {
    cards.iter().find(|card| card.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckItemState {
    Complete,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl CheckItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckItemState::Complete => "complete",
            CheckItemState::Incomplete => "incomplete",
            CheckItemState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    pub id: String,
    pub name: String,
    pub state: CheckItemState,
}

impl CheckItem {
    pub fn is_complete(&self) -> bool {
        self.state == CheckItemState::Complete
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(rename = "idCard")]
    pub card_id: String,
    #[serde(rename = "checkItems", default)]
    pub check_items: Vec<CheckItem>,
}

impl Checklist {
    pub fn all_complete(&self) -> bool {
        self.check_items.iter().all(CheckItem::is_complete)
    }

    pub fn find_item(&self, name: &str) -> Option<&CheckItem> {
        self.check_items.iter().find(|item| item.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "idModel")]
    pub model_id: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    pub active: bool,
}

/// Which kind of model a webhook watches. Doubles as the first callback path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    List,
    Card,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::List => "list",
            ModelType::Card => "card",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "list" => Ok(ModelType::List),
            "card" => Ok(ModelType::Card),
            _ => Err(format!("Invalid model type: {}", s)),
        }
    }
}

/// The board's five named lists, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLists {
    pub projects: List,
    pub active: List,
    pub todo: List,
    pub done: List,
    pub storage: List,
}

impl BoardLists {
    pub fn resolve(lists: &[List]) -> Result<Self> {
        let find = |name: ListName| {
            lists
                .iter()
                .find(|list| list.name == name.as_str())
                .cloned()
                .ok_or_else(|| {
                    WatcherError::Configuration(format!("The board needs a list named {:?}", name.as_str()))
                })
        };

        Ok(Self {
            projects: find(ListName::Projects)?,
            active: find(ListName::Active)?,
            todo: find(ListName::ToDo)?,
            done: find(ListName::Done)?,
            storage: find(ListName::Storage)?,
        })
    }

    pub fn get(&self, name: ListName) -> &List {
        match name {
            ListName::Projects => &self.projects,
            ListName::Active => &self.active,
            ListName::ToDo => &self.todo,
            ListName::Done => &self.done,
            ListName::Storage => &self.storage,
        }
    }

    /// Maps a list name seen in a payload back to one of the five, if it is one.
    pub fn classify(&self, list_name: &str) -> Option<ListName> {
        ListName::all()
            .iter()
            .copied()
            .find(|name| self.get(*name).name == list_name)
    }
}
