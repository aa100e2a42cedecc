//! The board API answered from a JSON file, for running without a hosted sheet.

use super::{Envelope, GatewayError, GatewayRequest};
use crate::storage::{load_board, persist_board, StoredBoard};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct LocalStore {
    path: PathBuf,
    board: Mutex<StoredBoard>,
}

impl LocalStore {
    pub async fn open(path: PathBuf) -> Self {
        let board = load_board(&path).await;
        Self {
            path,
            board: Mutex::new(board),
        }
    }

    pub async fn handle(&self, request: GatewayRequest) -> Result<Envelope, GatewayError> {
        let mut board = self.board.lock().await;
        let (envelope, changed) = apply(&mut board, request)?;
        if changed {
            persist_board(&self.path, &board).await?;
        }
        Ok(envelope)
    }
}

/// Runs one request against the board; the flag says whether it changed.
fn apply(board: &mut StoredBoard, request: GatewayRequest) -> Result<(Envelope, bool), GatewayError> {
    let outcome = match request {
        GatewayRequest::ReadShifts => (Envelope::data(to_json(&board.shifts)?), false),
        GatewayRequest::ReadDirectory => (Envelope::data(to_json(&board.directory)?), false),
        GatewayRequest::WriteShifts(shifts) => {
            let count = shifts.len();
            board.shifts = shifts;
            (Envelope::message(format!("{count}件のシフトを更新しました")), true)
        }
        GatewayRequest::AddEntry(entry) => {
            if entry.name.trim().is_empty() {
                (Envelope::failure("源氏名は必須です"), false)
            } else if board.directory.iter().any(|existing| existing.name == entry.name) {
                (Envelope::failure(format!("{}は既に登録されています", entry.name)), false)
            } else {
                board.directory.push(entry);
                (Envelope::message("URL情報を追加しました"), true)
            }
        }
        GatewayRequest::UpdateEntry(entry) => {
            match board.directory.iter_mut().find(|existing| existing.name == entry.name) {
                Some(existing) => {
                    *existing = entry;
                    (Envelope::message("URL情報を更新しました"), true)
                }
                None => (Envelope::failure(format!("{}が見つかりません", entry.name)), false),
            }
        }
        GatewayRequest::DeleteEntry { name } => {
            let before = board.directory.len();
            board.directory.retain(|existing| existing.name != name);
            if board.directory.len() == before {
                (Envelope::failure(format!("{name}が見つかりません")), false)
            } else {
                (Envelope::message("URL情報を削除しました"), true)
            }
        }
        GatewayRequest::UpdateCheck { name, checked } => {
            match board.shifts.iter_mut().find(|shift| shift.name == name) {
                Some(shift) => {
                    shift.checked = checked;
                    (Envelope::message("チェック状態を更新しました"), true)
                }
                None => (Envelope::failure(format!("{name}はシフトにいません")), false),
            }
        }
    };
    Ok(outcome)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
}
