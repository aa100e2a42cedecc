use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Wire form of a checked shift or directory entry.
pub const CHECKED_MARKER: &str = "済";

/// External profile sites a person can be listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Delidosu,
    Anecan,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Delidosu, Platform::Anecan];

    pub fn key(self) -> &'static str {
        match self {
            Platform::Delidosu => "delidosu",
            Platform::Anecan => "anecan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Delidosu => "でりどす",
            Platform::Anecan => "アネキャン",
        }
    }

    /// Accepts either the wire key or the display label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|platform| platform.key().eq_ignore_ascii_case(value) || platform.label() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delidosu_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anecan_name: String,
    #[serde(default, with = "check_marker")]
    pub checked: bool,
}

impl ShiftRecord {
    pub fn display_name(&self, platform: Platform) -> &str {
        match platform {
            Platform::Delidosu => &self.delidosu_name,
            Platform::Anecan => &self.anecan_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delidosu_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delidosu_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anecan_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anecan_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub class: String,
    #[serde(default, with = "main_store")]
    pub main_store: Option<Platform>,
    #[serde(default, with = "check_marker")]
    pub checked: bool,
}

impl DirectoryEntry {
    pub fn display_name(&self, platform: Platform) -> &str {
        match platform {
            Platform::Delidosu => &self.delidosu_name,
            Platform::Anecan => &self.anecan_name,
        }
    }

    pub fn url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Delidosu => &self.delidosu_url,
            Platform::Anecan => &self.anecan_url,
        }
    }

    /// Copy with surrounding whitespace removed from every text field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            delidosu_name: self.delidosu_name.trim().to_string(),
            delidosu_url: self.delidosu_url.trim().to_string(),
            anecan_name: self.anecan_name.trim().to_string(),
            anecan_url: self.anecan_url.trim().to_string(),
            class: self.class.trim().to_string(),
            main_store: self.main_store,
            checked: self.checked,
        }
    }
}

/// Fields posted by the add/edit form on the URL management page.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DirectoryForm {
    pub original: String,
    pub name: String,
    pub delidosu_name: String,
    pub delidosu_url: String,
    pub anecan_name: String,
    pub anecan_url: String,
    pub class: String,
    pub main_store: String,
}

impl DirectoryForm {
    pub fn is_edit(&self) -> bool {
        !self.original.trim().is_empty()
    }

    pub fn into_entry(self) -> DirectoryEntry {
        // The name input is disabled while editing, so the key comes from `original`.
        let name = if self.is_edit() { self.original } else { self.name };
        DirectoryEntry {
            name,
            delidosu_name: self.delidosu_name,
            delidosu_url: self.delidosu_url,
            anecan_name: self.anecan_name,
            anecan_url: self.anecan_url,
            class: self.class,
            main_store: Platform::parse(&self.main_store),
            checked: false,
        }
        .trimmed()
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckForm {
    pub name: String,
    // Unchecked boxes are not submitted at all.
    #[serde(default)]
    pub checked: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameForm {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckRequest {
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub name: String,
}

/// Roster rows posted as JSON instead of a spreadsheet file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterUploadRequest {
    #[serde(default)]
    pub file_name: String,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub count: usize,
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// The remote sheet hands back numbers or nulls in text columns.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    })
}

mod check_marker {
    use super::CHECKED_MARKER;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(checked: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *checked { CHECKED_MARKER } else { "" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(text)) => {
                let text = text.trim();
                text == CHECKED_MARKER || text.eq_ignore_ascii_case("true")
            }
            Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
            _ => false,
        })
    }
}

pub(crate) mod main_store {
    use super::Platform;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(store: &Option<Platform>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(store.map(Platform::key).unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Platform>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(text)) => Platform::parse(&text),
            _ => None,
        })
    }
}
