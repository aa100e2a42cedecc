//! View models for the three board pages. Pure: built from a cache snapshot,
//! painted by `ui`.

use crate::kana::{group_by_kana, KanaGroup};
use crate::models::DirectoryEntry;
use crate::reconcile::{find_entry, reconcile, unmatched, ShiftView};
use crate::state::BoardCache;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value == "error" {
            ToastKind::Error
        } else {
            ToastKind::Success
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftListView {
    pub date: Option<String>,
    pub heading: Option<String>,
    pub cards: Vec<ShiftView>,
    pub checked: usize,
    pub unmatched: Vec<String>,
}

impl ShiftListView {
    pub fn total(&self) -> usize {
        self.cards.len()
    }
}

/// Reconciles against the cached directory on every call.
pub fn shift_list(cache: &BoardCache) -> ShiftListView {
    let cards = reconcile(&cache.shifts, &cache.directory);
    let date = cache.roster_date.filter(|_| !cards.is_empty());
    ShiftListView {
        date: date.map(|date| date.format("%Y-%m-%d").to_string()),
        heading: date.map(roster_heading),
        checked: cards.iter().filter(|card| card.record.checked).count(),
        unmatched: unmatched(&cache.shifts, &cache.directory),
        cards,
    }
}

pub fn roster_heading(date: NaiveDate) -> String {
    date.format("📅 %Y年%m月%d日のシフト").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryView {
    pub groups: Vec<KanaGroup>,
    pub total: usize,
}

pub fn directory(cache: &BoardCache) -> DirectoryView {
    DirectoryView {
        groups: group_by_kana(&cache.directory),
        total: cache.directory.len(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlListView {
    pub query: String,
    pub entries: Vec<DirectoryEntry>,
    pub total: usize,
    /// Entry loaded into the form; `None` means the form adds a new one.
    pub editing: Option<DirectoryEntry>,
}

/// Entries whose name contains `query`, ignoring case, in directory order.
pub fn url_list(directory: &[DirectoryEntry], query: &str, edit: Option<&str>) -> UrlListView {
    let query = query.trim();
    let needle = query.to_lowercase();
    UrlListView {
        query: query.to_string(),
        entries: directory
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .cloned()
            .collect(),
        total: directory.len(),
        editing: edit.and_then(|name| find_entry(directory, name)).cloned(),
    }
}
