//! Message-file extraction: headers, body selection, decoding, redaction.
//!
//! Malformed content never fails extraction; every step degrades to a
//! sensible default. The only error case is input with no readable text
//! at all.

use crate::error::{IngestError, IngestResult};
use curator_core::ExtractedRecord;
use regex::Regex;
use std::sync::OnceLock;

/// Body size cap before enrichment; bounds the request payload.
pub const MAX_BODY_CHARS: usize = 60_000;

const TRUNCATION_MARKER: &str = "\n[truncated]";
const ATTACHMENT_PLACEHOLDER: &str = "[attachment omitted]";
const DEFAULT_DATE: &str = "Unknown date";
const DEFAULT_SUBJECT: &str = "(no subject)";

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^Date:[ \t]*(.+)$").unwrap())
}

fn subject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^Subject:[ \t]*(.+)$").unwrap())
}

fn attachment_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9+/=]{100,}").unwrap())
}

/// Turn raw message-file text into a structured record ready for
/// enrichment.
pub fn extract(source_name: &str, raw_text: &str) -> IngestResult<ExtractedRecord> {
    if raw_text.trim().is_empty() {
        return Err(IngestError::UnreadableContent(format!(
            "{source_name}: no readable text"
        )));
    }

    let raw_date = header_value(date_re(), raw_text).unwrap_or_else(|| DEFAULT_DATE.to_string());
    let raw_subject =
        header_value(subject_re(), raw_text).unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    let body = locate_body(raw_text);
    let body = narrow_to_text_plain(body).unwrap_or(body);

    let mut body_text = decode_entities(&decode_quoted_printable(body));
    body_text = attachment_run_re()
        .replace_all(&body_text, ATTACHMENT_PLACEHOLDER)
        .into_owned();

    if let Some((byte_idx, _)) = body_text.char_indices().nth(MAX_BODY_CHARS) {
        body_text.truncate(byte_idx);
        body_text.push_str(TRUNCATION_MARKER);
    }

    Ok(ExtractedRecord {
        source_name: source_name.to_string(),
        raw_date,
        raw_subject,
        body_text,
    })
}

fn header_value(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The body starts after the first blank line; headers-only or unbroken
/// text falls back to the whole input.
fn locate_body(text: &str) -> &str {
    if let Some((_, body)) = text.split_once("\r\n\r\n") {
        body
    } else if let Some((_, body)) = text.split_once("\n\n") {
        body
    } else {
        text
    }
}

/// For multipart bodies, prefer the inner text/plain part: the slice from
/// that part's header end to the next boundary marker.
fn narrow_to_text_plain(body: &str) -> Option<&str> {
    let marker = body.find("text/plain")?;
    let rest = &body[marker..];

    let header_end = rest
        .find("\r\n\r\n")
        .map(|i| i + 4)
        .or_else(|| rest.find("\n\n").map(|i| i + 2))?;
    let inner = &rest[header_end..];

    let end = inner.find("\n--").unwrap_or(inner.len());
    let slice = inner[..end].trim();
    (!slice.is_empty()).then_some(slice)
}

/// Decode `=XX` hex pairs and soft line breaks. Invalid escapes pass
/// through untouched.
fn decode_quoted_printable(text: &str) -> String {
    let unfolded = text.replace("=\r\n", "").replace("=\n", "");
    let bytes = unfolded.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

fn decode_entities(text: &str) -> String {
    // &amp; last, so already-decoded ampersands are not re-interpreted
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
