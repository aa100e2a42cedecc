use crate::errors::{AppError, CONNECTION_FAILED};
use crate::gateway::GatewayError;
use crate::kana::{group_by_kana, KanaGroup};
use crate::models::{
    ApiMessage, CheckForm, CheckRequest, DeleteRequest, DirectoryEntry, DirectoryForm, NameForm,
    RosterUploadRequest, ShiftRecord, UploadResponse,
};
use crate::reconcile::unmatched;
use crate::roster::build_roster;
use crate::sheet::{read_rows, rows_from_json, roster_date_from_file_name};
use crate::state::AppState;
use crate::ui::{render_directory_page, render_shift_page, render_url_page};
use crate::views::{self, ShiftListView, Toast, ToastKind};
use axum::{
    extract::{Multipart, Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};

const UPLOADED: &str = "Excelファイルをアップロードしました";
const CHECK_FAILED: &str = "チェック状態の更新に失敗しました";
const SAVE_FAILED: &str = "URL情報の保存に失敗しました";
const DELETE_FAILED: &str = "URL情報の削除に失敗しました";
const RELOAD_FAILED: &str = "一覧の再読み込みに失敗しました";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub toast: Option<String>,
    pub kind: Option<String>,
    pub q: Option<String>,
    pub edit: Option<String>,
}

impl PageQuery {
    fn toast(&self) -> Option<Toast> {
        let message = self.toast.as_deref().filter(|message| !message.is_empty())?;
        Some(Toast {
            kind: ToastKind::parse(self.kind.as_deref().unwrap_or_default()),
            message: message.to_string(),
        })
    }
}

pub async fn shift_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let cache = state.snapshot().await;
    Html(render_shift_page(&views::shift_list(&cache), query.toast().as_ref()))
}

pub async fn directory_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let cache = state.snapshot().await;
    Html(render_directory_page(&views::directory(&cache), query.toast().as_ref()))
}

pub async fn url_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let mut toast = query.toast();
    if let Err(err) = state.refresh_directory().await {
        error!("failed to load directory: {err}");
        toast = Some(Toast::error(err.user_message(CONNECTION_FAILED)));
    }
    let cache = state.snapshot().await;
    let view = views::url_list(
        &cache.directory,
        query.q.as_deref().unwrap_or_default(),
        query.edit.as_deref(),
    );
    Html(render_url_page(&view, toast.as_ref()))
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    match state.refresh_all().await {
        Ok(()) => redirect_to("/", None),
        Err(err) => {
            error!("refresh failed: {err}");
            redirect_to("/", Some(Toast::error(err.user_message(CONNECTION_FAILED))))
        }
    }
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Redirect {
    match receive_upload(&state, &mut multipart).await {
        Ok(_) => redirect_to("/", Some(Toast::success(UPLOADED))),
        Err(err) => {
            error!("roster upload failed: {}", err.message);
            redirect_to("/", Some(Toast::error(err.message)))
        }
    }
}

async fn receive_upload(state: &AppState, multipart: &mut Multipart) -> Result<usize, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
    }
    let (file_name, bytes) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::bad_request("ファイルが選択されていません"))?;

    let rows = read_rows(&file_name, &bytes)?;
    let roster = build_roster(&rows)?;
    publish_roster(state, roster, roster_date_from_file_name(&file_name)).await
}

/// Replaces the remote shift set, then re-fetches it.
async fn publish_roster(
    state: &AppState,
    roster: Vec<ShiftRecord>,
    date: Option<NaiveDate>,
) -> Result<usize, AppError> {
    let count = roster.len();
    let missing = {
        let cache = state.cache.lock().await;
        unmatched(&roster, &cache.directory)
    };
    if !missing.is_empty() {
        warn!(?missing, "roster names without a directory entry");
    }

    state.gateway.write_shifts(roster).await?;
    state.refresh_shifts().await?;
    state.cache.lock().await.roster_date = date;
    info!(count, "roster uploaded");
    Ok(count)
}

pub async fn toggle_check(State(state): State<AppState>, Form(form): Form<CheckForm>) -> Redirect {
    let checked = form.checked.is_some();
    match apply_check(&state, &form.name, checked).await {
        Ok(()) => redirect_to("/", None),
        Err(err) => redirect_to("/", Some(Toast::error(err.user_message(CHECK_FAILED)))),
    }
}

// The cached mark stays flipped even when the remote update fails.
async fn apply_check(state: &AppState, name: &str, checked: bool) -> Result<(), GatewayError> {
    state.patch_check(name, checked).await;
    state
        .gateway
        .update_check(name, checked)
        .await
        .inspect_err(|err| error!("check update for {name} failed: {err}"))?;
    Ok(())
}

pub async fn save_entry(State(state): State<AppState>, Form(form): Form<DirectoryForm>) -> Redirect {
    let editing = form.is_edit();
    let entry = form.into_entry();
    if entry.name.is_empty() {
        return redirect_to("/urls", Some(Toast::error("源氏名を入力してください")));
    }
    let back = if editing {
        format!("/urls?edit={}", urlencoding::encode(&entry.name))
    } else {
        "/urls".to_string()
    };

    match store_entry(&state, entry, editing).await {
        Ok(message) => redirect_to("/urls", Some(Toast::success(message))),
        Err(err) => redirect_to(&back, Some(Toast::error(err.user_message(SAVE_FAILED)))),
    }
}

async fn store_entry(
    state: &AppState,
    entry: DirectoryEntry,
    editing: bool,
) -> Result<String, GatewayError> {
    let reply = if editing {
        state.gateway.update_entry(entry).await?
    } else {
        state.gateway.add_entry(entry).await?
    };
    let message = reply.message.unwrap_or_else(|| "保存しました".to_string());
    Ok(reload_after_change(state, message).await)
}

pub async fn delete_entry(State(state): State<AppState>, Form(form): Form<NameForm>) -> Redirect {
    match remove_entry(&state, form.name.trim()).await {
        Ok(message) => redirect_to("/urls", Some(Toast::success(message))),
        Err(err) => redirect_to("/urls", Some(Toast::error(err.user_message(DELETE_FAILED)))),
    }
}

async fn remove_entry(state: &AppState, name: &str) -> Result<String, GatewayError> {
    let reply = state.gateway.delete_entry(name).await?;
    let message = reply.message.unwrap_or_else(|| "削除しました".to_string());
    Ok(reload_after_change(state, message).await)
}

// The change already landed remotely; a failed re-fetch only stales the cache.
async fn reload_after_change(state: &AppState, message: String) -> String {
    match state.refresh_all().await {
        Ok(()) => message,
        Err(err) => {
            error!("reload after directory change failed: {err}");
            format!("{message}（{RELOAD_FAILED}）")
        }
    }
}

pub async fn api_shifts(State(state): State<AppState>) -> Json<ShiftListView> {
    let cache = state.snapshot().await;
    Json(views::shift_list(&cache))
}

pub async fn api_upload_rows(
    State(state): State<AppState>,
    Json(payload): Json<RosterUploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let roster = build_roster(&rows_from_json(payload.rows))?;
    let date = roster_date_from_file_name(&payload.file_name);
    let count = publish_roster(&state, roster, date).await?;
    Ok(Json(UploadResponse {
        success: true,
        count,
        date: date.map(|date| date.format("%Y-%m-%d").to_string()),
    }))
}

pub async fn api_check(
    State(state): State<AppState>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<ApiMessage>, AppError> {
    apply_check(&state, &payload.name, payload.checked).await?;
    Ok(Json(ApiMessage::ok("チェック状態を更新しました")))
}

pub async fn api_directory(State(state): State<AppState>) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    state.refresh_directory().await?;
    Ok(Json(state.snapshot().await.directory))
}

pub async fn api_directory_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<KanaGroup>>, AppError> {
    state.refresh_directory().await?;
    let cache = state.snapshot().await;
    Ok(Json(group_by_kana(&cache.directory)))
}

pub async fn api_add_entry(
    State(state): State<AppState>,
    Json(entry): Json<DirectoryEntry>,
) -> Result<Json<ApiMessage>, AppError> {
    let entry = entry.trimmed();
    if entry.name.is_empty() {
        return Err(AppError::bad_request("源氏名を入力してください"));
    }
    let message = store_entry(&state, entry, false).await?;
    Ok(Json(ApiMessage::ok(message)))
}

pub async fn api_update_entry(
    State(state): State<AppState>,
    Json(entry): Json<DirectoryEntry>,
) -> Result<Json<ApiMessage>, AppError> {
    let message = store_entry(&state, entry.trimmed(), true).await?;
    Ok(Json(ApiMessage::ok(message)))
}

pub async fn api_delete_entry(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<ApiMessage>, AppError> {
    let message = remove_entry(&state, payload.name.trim()).await?;
    Ok(Json(ApiMessage::ok(message)))
}

/// Post/redirect/get, carrying an optional toast in the query string.
fn redirect_to(path: &str, toast: Option<Toast>) -> Redirect {
    let Some(toast) = toast else {
        return Redirect::to(path);
    };
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}toast={}&kind={}",
        urlencoding::encode(&toast.message),
        toast.kind.as_str()
    ))
}
