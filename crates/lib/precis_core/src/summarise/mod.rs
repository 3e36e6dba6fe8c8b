//! Extraction-independent document summarisation.
//!
//! Long text is broken into fixed-size pages; each page is summarised by the
//! LLM collaborator and the per-page outputs are concatenated in order.

pub mod openai;

use thiserror::Error;

pub use openai::OpenAiClient;

/// Instructional prefix prepended to every page.
const PROMPT_PREFIX: &str = "Can you please summarise the following text as \
simply and concisely as possible without losing any information\n";

/// Summarisation errors.
#[derive(Debug, Error)]
pub enum SummariseError {
    #[error("LLM call failed: {0}")]
    Llm(String),
}

/// The LLM collaborator seam.
///
/// `credential` is the API key chosen at submission time (the user's personal
/// key, or the server key with quota accounting). `max_units` caps the
/// requested output length; a summary is never budgeted longer than its
/// source page.
pub trait LlmClient: Send + Sync {
    fn complete(
        &self,
        credential: &str,
        prompt: &str,
        max_units: usize,
    ) -> impl Future<Output = Result<String, SummariseError>> + Send;
}

/// Character slice `[start, end)` of `text`.
///
/// Empty when the start offset is at or past the last valid index; the
/// paging loop uses this as its terminator, so the final call to the LLM is
/// never made on an empty page.
pub fn page(text: &str, start: usize, end: usize) -> String {
    let len = text.chars().count();
    if start >= len.saturating_sub(1) {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

/// Wrap a page in the instructional prompt.
pub fn format_prompt(text: &str) -> String {
    format!("{PROMPT_PREFIX}{text}")
}

/// Summarise a document page by page.
///
/// Pages are processed sequentially and joined with a line break, preserving
/// document order. Any per-page failure aborts the whole call; no partial
/// summary is returned.
pub async fn summarise_doc<C: LlmClient>(
    client: &C,
    credential: &str,
    text: &str,
    page_size: usize,
) -> Result<String, SummariseError> {
    let mut summaries = Vec::new();
    let mut start = 0;
    loop {
        let slice = page(text, start, start + page_size);
        if slice.is_empty() {
            break;
        }
        let max_units = slice.chars().count();
        let summary = client
            .complete(credential, &format_prompt(&slice), max_units)
            .await?;
        summaries.push(summary);
        start += page_size;
    }
    Ok(summaries.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; fails from `fail_from` (1-based call index) on.
    struct MockClient {
        calls: Mutex<Vec<(String, usize)>>,
        fail_from: Option<usize>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_from: None,
            }
        }

        fn failing_from(n: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_from: Some(n),
            }
        }
    }

    impl LlmClient for MockClient {
        async fn complete(
            &self,
            _credential: &str,
            prompt: &str,
            max_units: usize,
        ) -> Result<String, SummariseError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), max_units));
            let n = calls.len();
            if self.fail_from.is_some_and(|f| n >= f) {
                return Err(SummariseError::Llm("upstream failure".into()));
            }
            Ok(format!("summary-{n}"))
        }
    }

    #[test]
    fn page_clamps_to_text_end() {
        assert_eq!(page("Short", 0, 10), "Short");
    }

    #[test]
    fn page_past_end_is_empty() {
        assert_eq!(page("Text", 10, 20), "");
        // Start at the last valid index also terminates.
        assert_eq!(page("Text", 3, 10), "");
        assert_eq!(page("", 0, 10), "");
    }

    #[test]
    fn prompt_carries_the_instructional_prefix() {
        let prompt = format_prompt("some page");
        assert!(prompt.starts_with(PROMPT_PREFIX));
        assert!(prompt.ends_with("some page"));
    }

    #[tokio::test]
    async fn three_pages_concatenate_in_order() {
        let client = MockClient::new();
        let text = "a".repeat(2500);
        let summary = summarise_doc(&client, "key", &text, 1000).await.unwrap();
        assert_eq!(summary, "summary-1\nsummary-2\nsummary-3");

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        // Output budget is capped at each page's own length.
        assert_eq!(calls[0].1, 1000);
        assert_eq!(calls[2].1, 500);
        assert!(calls.iter().all(|(p, _)| p.starts_with(PROMPT_PREFIX)));
    }

    #[tokio::test]
    async fn failure_aborts_without_partial_output() {
        let client = MockClient::failing_from(2);
        let text = "b".repeat(2500);
        let result = summarise_doc(&client, "key", &text, 1000).await;
        assert!(matches!(result, Err(SummariseError::Llm(_))));
        // The failing call is the last one made.
        assert_eq!(client.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_text_makes_no_llm_calls() {
        let client = MockClient::new();
        let summary = summarise_doc(&client, "key", "", 1000).await.unwrap();
        assert_eq!(summary, "");
        assert!(client.calls.lock().unwrap().is_empty());
    }
}
