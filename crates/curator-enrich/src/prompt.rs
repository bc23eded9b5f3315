//! Prompt construction for the understanding service.

use curator_core::ExtractedRecord;

const TASK_PREAMBLE: &str = "Classify the content below. Respond with JSON only, \
matching the requested schema: a short topic, a list of tags, a brief HTML summary \
(summaryHtml), every URL mentioned in the content (urls), and the content date \
normalized to YYYY-MM-DD HH:mm:ss (normalizedDate).";

/// Prompt for a message file that went through the extractor.
pub fn record_prompt(record: &ExtractedRecord) -> String {
    format!(
        "{TASK_PREAMBLE}\n\nSource file: {}\nDate header: {}\nSubject: {}\n\nBody:\n{}",
        record.source_name, record.raw_date, record.raw_subject, record.body_text
    )
}

/// Prompt for a plain URL, with scraped page content when available.
pub fn url_prompt(url: &str, page_content: Option<&str>) -> String {
    match page_content {
        Some(content) => format!(
            "{TASK_PREAMBLE}\n\nURL: {url}\n\nPage content:\n{content}"
        ),
        None => format!(
            "{TASK_PREAMBLE}\n\nURL: {url}\n\nNo page content could be retrieved; \
classify from the URL itself."
        ),
    }
}

/// Prompt for a video URL with a validated transcript. The service is told
/// to stay strictly inside the transcript text.
pub fn transcript_prompt(url: &str, transcript: &str) -> String {
    format!(
        "{TASK_PREAMBLE}\n\nVideo URL: {url}\n\nGround your answer strictly in the \
transcript below. Do not use outside knowledge about the video, its author, or its \
platform; if the transcript does not support a claim, leave it out.\n\nTranscript:\n{transcript}"
    )
}
