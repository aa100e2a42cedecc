use crate::models::{main_store, DirectoryEntry, Platform, ShiftRecord};
use serde::Serialize;

/// A shift joined with its directory entry, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftView {
    #[serde(flatten)]
    pub record: ShiftRecord,
    pub delidosu_url: String,
    pub anecan_url: String,
    pub class: String,
    #[serde(serialize_with = "main_store::serialize")]
    pub main_store: Option<Platform>,
    pub registered: bool,
}

impl ShiftView {
    /// Empty when the person has no page on `platform`.
    pub fn url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Delidosu => &self.delidosu_url,
            Platform::Anecan => &self.anecan_url,
        }
    }
}

/// First entry with exactly this name. Duplicates are not merged.
pub fn find_entry<'a>(directory: &'a [DirectoryEntry], name: &str) -> Option<&'a DirectoryEntry> {
    directory.iter().find(|entry| entry.name == name)
}

pub fn reconcile(shifts: &[ShiftRecord], directory: &[DirectoryEntry]) -> Vec<ShiftView> {
    shifts
        .iter()
        .map(|shift| {
            let entry = find_entry(directory, &shift.name);
            ShiftView {
                record: shift.clone(),
                delidosu_url: entry.map(|e| e.delidosu_url.clone()).unwrap_or_default(),
                anecan_url: entry.map(|e| e.anecan_url.clone()).unwrap_or_default(),
                class: entry.map(|e| e.class.clone()).unwrap_or_default(),
                main_store: entry.and_then(|e| e.main_store),
                registered: entry.is_some(),
            }
        })
        .collect()
}

/// Roster names with no directory entry, in roster order.
pub fn unmatched(shifts: &[ShiftRecord], directory: &[DirectoryEntry]) -> Vec<String> {
    shifts
        .iter()
        .filter(|shift| find_entry(directory, &shift.name).is_none())
        .map(|shift| shift.name.clone())
        .collect()
}
