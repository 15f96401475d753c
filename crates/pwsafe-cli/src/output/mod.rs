//! Output formatting helpers for the CLI.
//!
//! Entries and safe metadata are collected into plain view structs first,
//! then printed as a table or as JSON.

mod json;
mod text;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use json::print_json;
pub use text::{print_entry, print_entry_list, print_info, print_policies};

/// One row of `pwsafe list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub group: String,
    pub title: String,
    pub user: String,
}

/// Everything `pwsafe show` prints.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDetail {
    pub uuid: String,
    pub group: String,
    pub title: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub url: String,
    pub email: String,
    pub notes: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub password_modified: Option<DateTime<Utc>>,
    pub password_expires: Option<DateTime<Utc>>,
    pub history_count: usize,
}

/// Safe metadata for `pwsafe info`.
#[derive(Debug, Clone, Serialize)]
pub struct SafeInfo {
    pub path: String,
    pub version: String,
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub iterations: u32,
    pub last_save_time: Option<DateTime<Utc>>,
    pub last_save_application: String,
    pub last_save_user: String,
    pub last_save_host: String,
    pub entries: usize,
}

/// A named password policy row.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySummary {
    pub name: String,
    pub length: u16,
    pub style: String,
    pub symbols: String,
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
