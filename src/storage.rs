use crate::models::{DirectoryEntry, ShiftRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::error;

/// On-disk document behind the local gateway backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoredBoard {
    #[serde(default)]
    pub shifts: Vec<ShiftRecord>,
    #[serde(default)]
    pub directory: Vec<DirectoryEntry>,
}

pub async fn load_board(path: &Path) -> StoredBoard {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(board) => board,
            Err(err) => {
                error!("failed to parse board file {}: {err}", path.display());
                StoredBoard::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredBoard::default(),
        Err(err) => {
            error!("failed to read board file {}: {err}", path.display());
            StoredBoard::default()
        }
    }
}

pub async fn persist_board(path: &Path, board: &StoredBoard) -> Result<(), std::io::Error> {
    let payload = serde_json::to_vec_pretty(board)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("shift_board_{tag}_{}_{nanos}", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_board() {
        let board = load_board(&temp_path("missing").join("board.json")).await;
        assert_eq!(board, StoredBoard::default());
    }

    #[tokio::test]
    async fn persisted_board_loads_back() {
        let path = temp_path("persist").join("nested").join("board.json");
        let board = StoredBoard {
            shifts: vec![ShiftRecord {
                name: "あかり".into(),
                time: "10:00".into(),
                checked: true,
                ..Default::default()
            }],
            directory: vec![DirectoryEntry {
                name: "あかり".into(),
                anecan_url: "https://a.example/akari".into(),
                ..Default::default()
            }],
        };
        persist_board(&path, &board).await.unwrap();
        assert_eq!(load_board(&path).await, board);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_board() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{not json").await.unwrap();
        assert_eq!(load_board(&path).await, StoredBoard::default());
    }
}
