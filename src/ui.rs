use crate::models::{DirectoryEntry, Platform};
use crate::reconcile::ShiftView;
use crate::views::{DirectoryView, ShiftListView, Toast, UrlListView};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Shifts,
    Directory,
    Urls,
}

impl Page {
    const ALL: [Page; 3] = [Page::Shifts, Page::Directory, Page::Urls];

    pub fn path(self) -> &'static str {
        match self {
            Page::Shifts => "/",
            Page::Directory => "/directory",
            Page::Urls => "/urls",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Page::Shifts => "本日のシフト",
            Page::Directory => "名簿",
            Page::Urls => "URL管理",
        }
    }
}

pub fn render_shift_page(view: &ShiftListView, toast: Option<&Toast>) -> String {
    render_page(Page::Shifts, toast, &shift_body(view))
}

pub fn render_directory_page(view: &DirectoryView, toast: Option<&Toast>) -> String {
    render_page(Page::Directory, toast, &directory_body(view))
}

pub fn render_url_page(view: &UrlListView, toast: Option<&Toast>) -> String {
    render_page(Page::Urls, toast, &url_body(view))
}

fn render_page(page: Page, toast: Option<&Toast>, body: &str) -> String {
    let nav: String = Page::ALL
        .iter()
        .map(|&item| {
            let active = if item == page { " active" } else { "" };
            format!(
                r#"<a class="nav-btn{active}" href="{}">{}</a>"#,
                item.path(),
                item.title()
            )
        })
        .collect();
    let toast = toast
        .map(|toast| {
            format!(
                r#"<div id="toast" class="toast {} show" role="status">{}</div>"#,
                toast.kind.as_str(),
                escape(&toast.message)
            )
        })
        .unwrap_or_default();

    PAGE_HTML
        .replace("{{TITLE}}", page.title())
        .replace("{{NAV}}", &nav)
        .replace("{{TOAST}}", &toast)
        .replace("{{BODY}}", body)
}

fn shift_body(view: &ShiftListView) -> String {
    let mut html = String::from(UPLOAD_FORM);

    if let Some(heading) = &view.heading {
        let _ = write!(html, r#"<h2 id="date-display">{}</h2>"#, escape(heading));
    }

    if view.cards.is_empty() {
        html.push_str(
            r#"<div id="empty-state" class="empty-state">シフトデータがありません。Excelファイルをアップロードしてください。</div>"#,
        );
        return html;
    }

    let _ = write!(
        html,
        r#"<p class="summary">チェック済み <strong>{}</strong> / {} 名</p>"#,
        view.checked,
        view.total()
    );
    if !view.unmatched.is_empty() {
        let names: Vec<String> = view.unmatched.iter().map(|name| escape(name)).collect();
        let _ = write!(
            html,
            r#"<p class="warning">URL未登録: {}</p>"#,
            names.join("、")
        );
    }

    html.push_str(r#"<div id="shift-list" class="shift-list">"#);
    for card in &view.cards {
        html.push_str(&shift_card(card));
    }
    html.push_str("</div>");
    html
}

fn shift_card(card: &ShiftView) -> String {
    let name = escape(&card.record.name);
    let checked = card.record.checked;
    let mut badges = String::new();
    if !card.class.is_empty() {
        let _ = write!(badges, r#"<span class="badge badge-class">{}</span>"#, escape(&card.class));
    }
    if let Some(store) = card.main_store {
        let _ = write!(badges, r#"<span class="badge badge-main">本店: {}</span>"#, store.label());
    }

    let buttons: String = Platform::ALL
        .iter()
        .map(|&platform| platform_button(platform, card.url(platform)))
        .collect();

    format!(
        r#"<div class="shift-item{checked_class}">
  <div class="shift-header">
    <div class="shift-info">
      <span class="shift-name">{name}</span>
      <span class="shift-time">{time}</span>{badges}
    </div>
    <form method="post" action="/shifts/check" class="check-form">
      <input type="hidden" name="name" value="{name}">
      <input type="checkbox" class="shift-checkbox" name="checked" value="1"{checked_attr} onchange="this.form.submit()" aria-label="{name}をチェック">
      <noscript><button type="submit" class="btn-small">更新</button></noscript>
    </form>
  </div>
  <div class="shift-buttons">{buttons}</div>
</div>"#,
        checked_class = if checked { " checked" } else { "" },
        checked_attr = if checked { " checked" } else { "" },
        time = escape(&card.record.time),
    )
}

fn platform_button(platform: Platform, url: &str) -> String {
    if url.is_empty() {
        format!(
            r#"<button class="btn-link btn-{}" disabled>{} (未登録)</button>"#,
            platform.key(),
            platform.label()
        )
    } else {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener" class="btn-link btn-{}">{}</a>"#,
            escape(url),
            platform.key(),
            platform.label()
        )
    }
}

fn directory_body(view: &DirectoryView) -> String {
    if view.groups.is_empty() {
        return r#"<div id="directory-empty-state" class="empty-state">登録されている人がいません</div>"#
            .to_string();
    }

    let mut html = format!(r#"<p class="summary">登録 {} 名</p>"#, view.total);
    html.push_str(r#"<div id="directory-list" class="directory-list">"#);
    for group in &view.groups {
        let _ = write!(
            html,
            r#"<section class="kana-group"><h2 class="kana-label">{}</h2><ul>"#,
            group.label
        );
        for entry in &group.entries {
            let links: String = Platform::ALL
                .iter()
                .map(|&platform| platform_button(platform, entry.url(platform)))
                .collect();
            let class = if entry.class.is_empty() {
                String::new()
            } else {
                format!(r#"<span class="badge badge-class">{}</span>"#, escape(&entry.class))
            };
            let _ = write!(
                html,
                r#"<li class="directory-item"><span class="directory-name">{}</span>{class}<span class="directory-links">{links}</span></li>"#,
                escape(&entry.name)
            );
        }
        html.push_str("</ul></section>");
    }
    html.push_str("</div>");
    html
}

fn url_body(view: &UrlListView) -> String {
    let mut html = entry_form(view.editing.as_ref());

    let _ = write!(
        html,
        r#"<form class="search" method="get" action="/urls">
  <input id="search-input" type="search" name="q" value="{}" placeholder="源氏名で検索">
  <button type="submit" class="btn-secondary">検索</button>
</form>"#,
        escape(&view.query)
    );

    if view.total == 0 {
        html.push_str(r#"<div id="url-empty-state" class="empty-state">URL情報が登録されていません</div>"#);
        return html;
    }
    if view.entries.is_empty() {
        html.push_str(r#"<p class="hint">該当する人がいません</p>"#);
        return html;
    }

    html.push_str(r#"<div id="url-list" class="url-list">"#);
    for entry in &view.entries {
        html.push_str(&url_item(entry));
    }
    html.push_str("</div>");
    html
}

fn url_item(entry: &DirectoryEntry) -> String {
    let name = escape(&entry.name);
    let mut rows = String::new();
    for platform in Platform::ALL {
        rows.push_str(&url_row(&format!("{}名", platform.label()), entry.display_name(platform)));
        rows.push_str(&url_row(&format!("{}URL", platform.label()), entry.url(platform)));
    }
    rows.push_str(&url_row("クラス", &entry.class));
    rows.push_str(&url_row("本店", entry.main_store.map(Platform::label).unwrap_or_default()));

    format!(
        r#"<div class="url-item" data-name="{name}">
  <div class="url-item-header">
    <div class="url-item-name">{name}</div>
    <div class="url-item-actions">
      <a class="btn-edit" href="/urls?edit={encoded}">編集</a>
      <details class="confirm">
        <summary class="btn-delete">削除</summary>
        <form method="post" action="/urls/delete">
          <p>{name}を削除しますか？</p>
          <input type="hidden" name="name" value="{name}">
          <button type="submit" class="btn-delete">削除する</button>
        </form>
      </details>
    </div>
  </div>
  <div class="url-item-content">{rows}</div>
</div>"#,
        encoded = urlencoding::encode(&entry.name),
    )
}

fn url_row(label: &str, value: &str) -> String {
    if value.is_empty() {
        format!(
            r#"<div class="url-row"><div class="url-label">{}</div><div class="url-value empty">未設定</div></div>"#,
            escape(label)
        )
    } else {
        format!(
            r#"<div class="url-row"><div class="url-label">{}</div><div class="url-value">{}</div></div>"#,
            escape(label),
            escape(value)
        )
    }
}

fn entry_form(editing: Option<&DirectoryEntry>) -> String {
    let blank = DirectoryEntry::default();
    let entry = editing.unwrap_or(&blank);
    let title = if editing.is_some() { "URL情報を編集" } else { "URL情報を追加" };
    let name_field = match editing {
        Some(entry) => format!(
            r#"<input type="hidden" name="original" value="{0}"><input id="modal-name" type="text" value="{0}" disabled>"#,
            escape(&entry.name)
        ),
        None => r#"<input id="modal-name" type="text" name="name" required>"#.to_string(),
    };

    let mut fields = String::new();
    for platform in Platform::ALL {
        let key = platform.key();
        let label = platform.label();
        let _ = write!(
            fields,
            r#"<label>{label}名<input type="text" name="{key}_name" value="{}"></label>
<label>{label}URL<input type="url" name="{key}_url" value="{}"></label>"#,
            escape(entry.display_name(platform)),
            escape(entry.url(platform))
        );
    }

    // One radio group keeps the main store exclusive.
    let mut stores = format!(
        r#"<label class="radio"><input type="radio" name="main_store" value=""{}>なし</label>"#,
        if entry.main_store.is_none() { " checked" } else { "" }
    );
    for platform in Platform::ALL {
        let _ = write!(
            stores,
            r#"<label class="radio"><input type="radio" name="main_store" value="{}"{}>{}</label>"#,
            platform.key(),
            if entry.main_store == Some(platform) { " checked" } else { "" },
            platform.label()
        );
    }

    let cancel = if editing.is_some() {
        r#"<a class="btn-secondary" href="/urls">キャンセル</a>"#
    } else {
        ""
    };

    format!(
        r#"<form id="url-form" class="entry-form" method="post" action="/urls/save">
  <h2 id="modal-title">{title}</h2>
  <label>源氏名{name_field}</label>
  {fields}
  <label>クラス<input type="text" name="class" value="{class}"></label>
  <fieldset class="main-store"><legend>本店</legend>{stores}</fieldset>
  <div class="form-actions"><button type="submit" class="btn-primary">保存</button>{cancel}</div>
</form>"#,
        class = escape(&entry.class),
    )
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const UPLOAD_FORM: &str = r#"<section class="toolbar">
  <form class="upload" method="post" action="/upload" enctype="multipart/form-data">
    <label class="file-label">Excelファイル<input id="excel-upload" type="file" name="file" accept=".xlsx,.xls,.xlsm,.ods,.csv" required></label>
    <button type="submit" class="btn-primary">アップロード</button>
  </form>
  <form method="post" action="/refresh">
    <button type="submit" class="btn-secondary">再読み込み</button>
  </form>
</section>"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} | シフトボード</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Hiragino Sans", "Noto Sans JP", sans-serif;
      display: grid;
      justify-items: center;
      padding: 24px 14px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 28px;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 4vw, 2.2rem);
    }

    nav {
      display: flex;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
    }

    .nav-btn {
      border-radius: 999px;
      padding: 8px 14px;
      font-weight: 600;
      color: #6b645d;
      text-decoration: none;
    }

    .nav-btn.active {
      background: white;
      color: var(--accent-2);
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    button, .btn-link, .btn-edit, .btn-secondary, .btn-delete {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      text-decoration: none;
      display: inline-flex;
      align-items: center;
      justify-content: center;
    }

    .btn-primary { background: var(--accent); color: white; }
    .btn-secondary { background: rgba(47, 72, 88, 0.1); color: var(--accent-2); }
    .btn-edit { background: var(--accent-2); color: white; }
    .btn-delete { background: #c63b2b; color: white; list-style: none; }
    .btn-link { color: white; }
    .btn-delidosu { background: #e0457b; }
    .btn-anecan { background: #7b5cd6; }
    button[disabled] { background: #d6d1ca; color: #8b857d; cursor: not-allowed; }

    .toolbar, .upload, .search, .form-actions {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    .shift-list, .url-list {
      display: flex;
      flex-direction: column;
      gap: 12px;
    }

    .shift-item, .url-item, .entry-form {
      background: white;
      border-radius: 18px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .shift-item.checked { opacity: 0.55; }

    .shift-header, .url-item-header {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 10px;
    }

    .shift-name, .url-item-name { font-size: 1.2rem; font-weight: 600; }
    .shift-time { margin-left: 10px; color: var(--accent-2); }
    .shift-checkbox { width: 26px; height: 26px; }
    .shift-buttons { display: flex; gap: 8px; margin-top: 12px; flex-wrap: wrap; }

    .badge {
      margin-left: 8px;
      padding: 2px 8px;
      border-radius: 999px;
      font-size: 0.75rem;
      background: rgba(47, 72, 88, 0.1);
    }

    .badge-main { background: rgba(255, 107, 74, 0.18); }

    .kana-label {
      margin: 12px 0 6px;
      font-size: 1.1rem;
      color: var(--accent-2);
    }

    .kana-group ul { list-style: none; margin: 0; padding: 0; display: grid; gap: 8px; }
    .directory-item { display: flex; align-items: center; flex-wrap: wrap; gap: 8px; }
    .directory-name { font-weight: 600; min-width: 8em; }
    .directory-links { display: flex; gap: 6px; }

    .url-row { display: grid; grid-template-columns: 9em 1fr; gap: 8px; padding: 4px 0; }
    .url-label { color: #8b857d; font-size: 0.85rem; }
    .url-value { word-break: break-all; }
    .url-value.empty { color: #b5aea6; }
    .url-item-actions { display: flex; gap: 8px; align-items: flex-start; }

    .entry-form { display: grid; gap: 10px; }
    .entry-form label { display: grid; gap: 4px; font-size: 0.9rem; }
    .entry-form input[type="text"], .entry-form input[type="url"], .search input {
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 12px;
      padding: 10px 12px;
      font-size: 1rem;
    }
    .entry-form .radio { display: inline-flex; gap: 4px; margin-right: 12px; }

    .summary, .hint { margin: 0; color: #6f6a65; }
    .warning { margin: 0; color: #b0701c; }

    .empty-state {
      padding: 36px 16px;
      text-align: center;
      color: #8b857d;
    }

    .toast {
      padding: 12px 16px;
      border-radius: 14px;
      font-weight: 600;
    }

    .toast.success { background: rgba(45, 122, 75, 0.12); color: #2d7a4b; }
    .toast.error { background: rgba(198, 59, 43, 0.12); color: #c63b2b; }

    @media (max-width: 600px) {
      .app {
        padding: 22px 16px;
      }
      .url-row {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>シフトボード</h1>
      <nav>{{NAV}}</nav>
    </header>
    {{TOAST}}
    {{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftRecord;
    use crate::state::BoardCache;
    use crate::views;

    fn cache() -> BoardCache {
        BoardCache {
            shifts: vec![ShiftRecord {
                name: "あかり".into(),
                time: "10:00".into(),
                ..Default::default()
            }],
            directory: vec![DirectoryEntry {
                name: "あかり".into(),
                anecan_url: "https://a.example/akari?x=1&y=2".into(),
                main_store: Some(Platform::Anecan),
                ..Default::default()
            }],
            roster_date: None,
        }
    }

    #[test]
    fn shift_page_shows_links_and_unregistered_buttons() {
        let html = render_shift_page(&views::shift_list(&cache()), None);
        assert!(html.contains(r#"href="https://a.example/akari?x=1&amp;y=2""#));
        assert!(html.contains("でりどす (未登録)"));
        assert!(html.contains("本店: アネキャン"));
        assert!(!html.contains(r#"id="empty-state""#));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let cache = cache();
        let toast = Toast::success("保存しました");
        let first = render_shift_page(&views::shift_list(&cache), Some(&toast));
        let second = render_shift_page(&views::shift_list(&cache), Some(&toast));
        assert_eq!(first, second);
        assert_eq!(first.matches(r#"class="shift-item"#).count(), 1);
    }

    #[test]
    fn empty_lists_show_their_empty_state() {
        let empty = BoardCache::default();
        assert!(render_shift_page(&views::shift_list(&empty), None).contains(r#"id="empty-state""#));
        assert!(render_directory_page(&views::directory(&empty), None)
            .contains(r#"id="directory-empty-state""#));
        assert!(render_url_page(&views::url_list(&[], "", None), None).contains(r#"id="url-empty-state""#));
    }

    #[test]
    fn names_are_escaped() {
        let mut cache = cache();
        cache.shifts[0].name = "<b>\"x\"</b>".into();
        let html = render_shift_page(&views::shift_list(&cache), None);
        assert!(html.contains("&lt;b&gt;&quot;x&quot;&lt;/b&gt;"));
        assert!(!html.contains("<b>\"x\"</b>"));
    }

    #[test]
    fn edit_form_marks_main_store() {
        let cache = cache();
        let html = render_url_page(&views::url_list(&cache.directory, "", Some("あかり")), None);
        assert!(html.contains("URL情報を編集"));
        assert!(html.contains(r#"name="original" value="あかり""#));
        assert!(html.contains(r#"value="anecan" checked"#));
    }

    #[test]
    fn toast_is_painted_with_kind() {
        let html = render_directory_page(
            &views::directory(&cache()),
            Some(&Toast::error("通信に失敗しました")),
        );
        assert!(html.contains(r#"class="toast error show""#));
        assert!(html.contains("通信に失敗しました"));
    }
}
