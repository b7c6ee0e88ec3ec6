//! Server-side HTML rendering
//!
//! Turn content is treated as Markdown. Raw HTML inside it is rendered as
//! text and link targets are restricted to web schemes, so neither the user
//! nor the model can inject markup into the page.

use crate::conversation::{Conversation, Role, Turn};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::fmt::Write;

pub const PAGE_TITLE: &str = "World Travel Guide Chat: Journey with Gemini";

/// Sparkles emoji drawn as an inline SVG favicon
const FAVICON: &str = "data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'><text y='.9em' font-size='90'>✨</text></svg>";

const HEADER_IMAGE_URL: &str = "https://www.stockvault.net/data/2016/12/25/219513/preview16.jpg";

/// Render the full chat page for one conversation
pub fn render_page(conversation: &Conversation) -> String {
    let mut page = String::with_capacity(4096);
    push_head(&mut page);

    let _ = writeln!(
        page,
        r#"<div class="center-image"><img src="{HEADER_IMAGE_URL}" width="300" alt="Travel destinations"></div>"#
    );
    let _ = writeln!(page, r#"<div class="main-title">{PAGE_TITLE}</div>"#);

    page.push_str("<div class=\"chat-history\">\n");
    for turn in conversation.turns() {
        push_turn(&mut page, turn);
    }
    page.push_str("</div>\n");

    page.push_str(concat!(
        r#"<form class="chat-form" method="post" action="/chat">"#,
        "\n",
        r#"<label for="message">What's your travel query?</label>"#,
        "\n",
        r#"<input class="input-box" id="message" name="message" type="text" placeholder="Type your message here..." autocomplete="off" autofocus>"#,
        "\n</form>\n",
        r#"<form class="reset-form" method="post" action="/reset">"#,
        r#"<button class="reset-button" type="submit" title="Click to start a new journey">Reset Chat</button>"#,
        "</form>\n",
    ));

    push_tail(&mut page);
    page
}

/// Render the page shown when startup configuration failed
pub fn render_halted(message: &str) -> String {
    let mut page = String::with_capacity(1024);
    push_head(&mut page);
    let _ = writeln!(page, r#"<div class="main-title">{PAGE_TITLE}</div>"#);
    let _ = writeln!(
        page,
        r#"<div class="config-error" role="alert">{}</div>"#,
        escape_text(message)
    );
    push_tail(&mut page);
    page
}

fn push_head(page: &mut String) {
    let _ = writeln!(
        page,
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en">"#,
            "\n<head>\n",
            r#"<meta charset="utf-8">"#,
            "\n",
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "\n<title>{}</title>\n",
            r#"<link rel="icon" href="{}">"#,
            "\n",
            r#"<link rel="stylesheet" href="/assets/style.css">"#,
            "\n</head>\n<body>\n",
            r#"<main class="container">"#,
        ),
        PAGE_TITLE,
        FAVICON
    );
}

fn push_tail(page: &mut String) {
    page.push_str("</main>\n</body>\n</html>\n");
}

fn push_turn(page: &mut String, turn: &Turn) {
    let css_class = match turn.role {
        Role::User => "user",
        Role::System | Role::Assistant => "assistant",
    };
    let _ = write!(
        page,
        r#"<div class="chat-entry {css_class}"><strong>{}:</strong> <div class="chat-content">"#,
        turn.role.label()
    );
    push_markdown(page, &turn.content);
    page.push_str("</div></div>\n");
}

/// Append `text` rendered as Markdown with raw HTML neutralised
fn push_markdown(out: &mut String, text: &str) {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    html::push_html(out, events);
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim_start().to_ascii_lowercase();
    let has_scheme = lower
        .split_once(':')
        .is_some_and(|(scheme, _)| !scheme.contains(['/', '?', '#']));
    let allowed = ["http:", "https:", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));

    if has_scheme && !allowed {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// HTML-escape plain text
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    html::push_html(&mut out, std::iter::once(Event::Text(CowStr::Borrowed(text))));
    out
}
