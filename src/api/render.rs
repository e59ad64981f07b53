// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-side HTML rendering for both apps
//!
//! Every function here is a pure projection of its inputs. Model output is
//! treated as Markdown and sanitised; visitor text is escaped.

use pulldown_cmark::{html, Options, Parser};

use crate::rag::{ChatTurn, SessionPhase};
use crate::vision::EncodedImage;

pub const FOOD_SCANNER_TITLE: &str = "🍽️ AI Food Image Scanner (powered by OpenAI)";
pub const READER_TITLE: &str = "RAGified Reader";

/// Sidebar previews show at most this many characters of a question
pub const SIDEBAR_PREVIEW_CHARS: usize = 50;

pub const INDEXING_MESSAGE: &str = "🔍 Extracting content and indexing...";
pub const INDEXED_MESSAGE: &str = "✅ PDF indexed! Start chatting below.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "notice-info",
            NoticeLevel::Success => "notice-success",
            NoticeLevel::Warning => "notice-warning",
            NoticeLevel::Error => "notice-error",
        }
    }
}

/// A leveled status message shown above the page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render Markdown to sanitised HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut unsafe_html = String::new();
    html::push_html(&mut unsafe_html, parser);
    ammonia::clean(&unsafe_html)
}

/// `N. <first 50 chars>...` label for the question history sidebar
pub fn sidebar_label(position: usize, question: &str) -> String {
    let preview: String = question.chars().take(SIDEBAR_PREVIEW_CHARS).collect();
    format!("{}. {}...", position + 1, preview)
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            format!(
                r#"<div class="notice {}">{}</div>"#,
                n.level.css_class(),
                escape_html(&n.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
main { flex: 1; max-width: 52rem; padding: 2rem; }
aside { width: 18rem; padding: 2rem 1rem; background: #f4f5f7; }
aside ol { padding-left: 0; list-style: none; font-size: 0.9rem; }
.notice { padding: 0.75rem 1rem; border-radius: 0.4rem; margin: 0.5rem 0; }
.notice-info { background: #e7f1fb; color: #0b4a80; }
.notice-success { background: #e6f6ea; color: #1b5e20; }
.notice-warning { background: #fff6db; color: #7a5a00; }
.notice-error { background: #fdecec; color: #8e1c1c; }
.chat-user, .chat-assistant { padding: 0.75rem 1rem; margin: 0.5rem 0; border-radius: 0.4rem; }
.chat-user { background: #f0f2f6; }
.chat-assistant { background: #ffffff; border: 1px solid #e3e5e8; }
.preview img { max-width: 100%; border-radius: 0.4rem; }
form { margin: 1rem 0; }
"#;

/// Wrap content in the shared page layout
pub fn layout(title: &str, notices: &[Notice], body: &str, sidebar: Option<&str>) -> String {
    let sidebar = sidebar
        .map(|s| format!("<aside>{}</aside>", s))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{sidebar}
<main>
<h1>{title}</h1>
{notices}
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        sidebar = sidebar,
        notices = render_notices(notices),
        body = body,
    )
}

/// Page shown on every route when a credential is missing or malformed.
/// It never contains an upload control.
pub fn halted_page(title: &str, warning: &str) -> String {
    layout(title, &[Notice::warning(warning)], "", None)
}

const FOOD_UPLOAD_FORM: &str = r#"<form action="/analyze" method="post" enctype="multipart/form-data">
<label for="food_image">Upload a food image (jpg, jpeg, png)</label>
<input type="file" id="food_image" name="food_image" accept=".jpg,.jpeg,.png,image/jpeg,image/png" required>
<button type="submit">Analyze</button>
</form>"#;

/// What the food scanner shows after a request
#[derive(Debug, Default)]
pub struct FoodView<'a> {
    pub preview: Option<&'a EncodedImage>,
    pub analysis: Option<&'a str>,
    pub notices: Vec<Notice>,
}

pub fn food_page(view: &FoodView<'_>) -> String {
    let mut body = String::from(FOOD_UPLOAD_FORM);

    if let Some(image) = view.preview {
        body.push_str(&format!(
            r#"<div class="preview"><img src="{}" alt="Uploaded Food Image"><p>Uploaded Food Image ({}×{})</p></div>"#,
            image.data_url(),
            image.info.width,
            image.info.height
        ));
    }
    if let Some(analysis) = view.analysis {
        body.push_str(&format!(
            r#"<section class="analysis"><h2>🔍 Nutrition Analysis Result</h2>{}</section>"#,
            markdown_to_html(analysis)
        ));
    }

    layout(FOOD_SCANNER_TITLE, &view.notices, &body, None)
}

const READER_UPLOAD_FORM: &str = r#"<form action="/upload" method="post" enctype="multipart/form-data">
<label for="document">📄 Upload your PDF</label>
<input type="file" id="document" name="document" accept=".pdf,application/pdf" required>
<button type="submit">Upload</button>
</form>"#;

const READER_ASK_FORM: &str = r#"<form action="/ask" method="post">
<input type="text" name="question" placeholder="Ask a question about the PDF..." autocomplete="off" required>
<button type="submit">Send</button>
</form>"#;

const READER_END_FORM: &str = r#"<form action="/session/end" method="post">
<button type="submit">End session</button>
</form>"#;

/// Projection of a reader session for rendering
#[derive(Debug)]
pub struct ReaderView<'a> {
    pub phase: SessionPhase,
    pub document_name: Option<&'a str>,
    pub index_error: Option<&'a str>,
    pub history: &'a [ChatTurn],
    pub notices: Vec<Notice>,
}

/// Chat transcript in chronological order, each question followed by its answer
pub fn render_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| {
            format!(
                "<div class=\"chat-user\">{}</div>\n<div class=\"chat-assistant\">{}</div>",
                escape_html(turn.question()),
                markdown_to_html(turn.answer())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_sidebar(history: &[ChatTurn]) -> String {
    let mut html = String::from("<h2>🕘 Previous Questions</h2>");
    if history.is_empty() {
        html.push_str("<p>No questions yet.</p>");
        return html;
    }
    html.push_str("<ol>");
    for (i, turn) in history.iter().enumerate() {
        html.push_str(&format!(
            "<li>{}</li>",
            escape_html(&sidebar_label(i, turn.question()))
        ));
    }
    html.push_str("</ol>");
    html
}

pub fn reader_page(view: &ReaderView<'_>) -> String {
    let mut notices = view.notices.clone();
    let mut body = String::new();

    match view.phase {
        SessionPhase::Empty => body.push_str(READER_UPLOAD_FORM),
        SessionPhase::Indexing => {
            notices.push(Notice::info(INDEXING_MESSAGE));
            body.push_str(r#"<meta http-equiv="refresh" content="2">"#);
            body.push_str(READER_END_FORM);
        }
        SessionPhase::Ready => {
            if let Some(name) = view.document_name {
                body.push_str(&format!(
                    r#"<p class="document">📄 {}</p>"#,
                    escape_html(name)
                ));
            }
            body.push_str(&render_history(view.history));
            body.push_str(READER_ASK_FORM);
            body.push_str(READER_END_FORM);
        }
        SessionPhase::IndexError => {
            let message = view.index_error.unwrap_or("Indexing failed.");
            notices.push(Notice::error(message));
            body.push_str(READER_END_FORM);
        }
    }

    let sidebar = render_sidebar(view.history);
    layout(READER_TITLE, &notices, &body, Some(&sidebar))
}
