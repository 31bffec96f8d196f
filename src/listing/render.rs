//! Listing rendering.

use std::fmt::Write;

use chrono::SecondsFormat;

use super::ListingEntry;
use crate::config::ListingFormat;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const HEAD: &str =
    "<!DOCTYPE html><html><head><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">";

/// A rendered listing body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedListing {
    pub content_type: &'static str,
    pub body: String,
}

/// Render sorted entries under `prefix`. Every body ends with a newline.
pub fn render(
    format: ListingFormat,
    prefix: &str,
    entries: &[ListingEntry],
) -> Result<RenderedListing, serde_json::Error> {
    let (content_type, mut body) = match format {
        ListingFormat::Json => (JSON_CONTENT_TYPE, serde_json::to_string(entries)?),
        ListingFormat::Html => (HTML_CONTENT_TYPE, html(entries)),
        ListingFormat::Shtml => (HTML_CONTENT_TYPE, simple_html(entries)),
        ListingFormat::Apache => (HTML_CONTENT_TYPE, apache(prefix, entries)),
    };
    body.push('\n');
    Ok(RenderedListing { content_type, body })
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn anchor(out: &mut String, name: &str) {
    let name = escape(name);
    let _ = write!(out, "<a href=\"{name}\">{name}</a>");
}

fn timestamp(entry: &ListingEntry) -> Option<String> {
    entry
        .last_modified
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn html(entries: &[ListingEntry]) -> String {
    let mut out = format!("{HEAD}</head><body><ul>");
    for entry in entries {
        out.push_str("<li>");
        anchor(&mut out, &entry.name);
        if let Some(ts) = timestamp(entry) {
            out.push(' ');
            out.push_str(&ts);
        }
        out.push_str("</li>");
    }
    out.push_str("</ul></body></html>");
    out
}

fn simple_html(entries: &[ListingEntry]) -> String {
    let mut out = String::from("<!DOCTYPE html><html><body>");
    for entry in entries {
        anchor(&mut out, &entry.name);
        out.push_str("<br>");
    }
    out.push_str("</body></html>");
    out
}

fn apache(prefix: &str, entries: &[ListingEntry]) -> String {
    let prefix = escape(prefix);
    let mut out = format!(
        "{HEAD}<title>Index of {prefix}</title></head><body><h1>Index of {prefix}</h1>\
         <pre><table><tr><th>Name</th><th>Last Modified</th><th>Size</th></tr>"
    );
    for entry in entries {
        out.push_str("<tr><td>");
        anchor(&mut out, &entry.name);
        let modified = timestamp(entry).unwrap_or_else(|| "-".to_string());
        let size = if entry.size >= 0 {
            human_size(entry.size as u64)
        } else {
            "-".to_string()
        };
        let _ = write!(out, "</td><td>{modified}</td><td>{size}</td></tr>");
    }
    out.push_str("</table><hr></pre></body></html>");
    out
}

/// Size with a `k`/`M`/`G` suffix, dividing by 1024 while the value exceeds 2000.
pub fn human_size(mut size: u64) -> String {
    let mut suffix = "";
    for unit in ["k", "M", "G"] {
        if size <= 2000 {
            break;
        }
        size /= 1024;
        suffix = unit;
    }
    format!("{size}{suffix}")
}
