//! Watches a Trello board and keeps its To Do, Done, and Storage lists consistent with the
//! checklists of the projects on its Active list.

pub mod api;
pub mod config;
pub mod domain;
pub mod services;
pub mod trello;
