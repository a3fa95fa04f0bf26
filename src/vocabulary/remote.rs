use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::VocabularyError;
use crate::config::VocabularyConfig;

/// Source of fresh reference-list contents.
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, name: &str, url: &str) -> Result<Vec<String>, VocabularyError>;
}

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Fetches reference lists over HTTP with retry and doubling backoff.
#[derive(Debug, Clone)]
pub struct HttpReferenceFetcher {
    client: Client,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl HttpReferenceFetcher {
    pub fn new(config: &VocabularyConfig) -> Result<Self, VocabularyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("fair-eva/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| VocabularyError::Client { source })?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            max_backoff: MAX_BACKOFF,
        })
    }
}

#[async_trait]
impl ReferenceFetcher for HttpReferenceFetcher {
    async fn fetch(&self, name: &str, url: &str) -> Result<Vec<String>, VocabularyError> {
        let mut last_error = String::new();
        let delays = std::iter::once(None).chain(
            backoff_schedule(self.initial_backoff, self.max_backoff, self.max_retries).map(Some),
        );

        for (attempt, delay) in delays.enumerate() {
            if let Some(backoff) = delay {
                debug!(
                    vocabulary = name,
                    attempt,
                    max_retries = self.max_retries,
                    ?backoff,
                    "retrying reference list download"
                );
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.map_err(|source| VocabularyError::Http {
                            url: url.to_string(),
                            source,
                        })?;
                        return parse_reference_list(&body).ok_or_else(|| VocabularyError::Body {
                            url: url.to_string(),
                        });
                    }
                    if status.is_client_error() {
                        return Err(VocabularyError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    last_error = format!("HTTP {status}");
                }
                Err(err) => last_error = err.to_string(),
            }
        }

        Err(VocabularyError::Exhausted {
            name: name.to_string(),
            attempts: self.max_retries + 1,
            reason: last_error,
        })
    }
}

/// Delay before each of `retries` retries, doubling from `initial` and capped at `max`.
fn backoff_schedule(initial: Duration, max: Duration, retries: u32) -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(initial.min(max)), move |delay| {
        Some(delay.saturating_mul(2).min(max))
    })
    .take(retries as usize)
}

/// Accepts a JSON array of strings or of objects carrying an identifier field,
/// the SPDX `{"licenses": [...]}` layout, or newline separated plain text.
pub(crate) fn parse_reference_list(body: &str) -> Option<Vec<String>> {
    let items = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(entries)) => collect_entries(&entries),
        Ok(Value::Object(fields)) => fields
            .values()
            .find_map(|value| value.as_array())
            .map(|entries| collect_entries(entries))
            .unwrap_or_default(),
        Ok(_) => Vec::new(),
        Err(_) => body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
    };
    (!items.is_empty()).then_some(items)
}

fn collect_entries(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(item) => Some(item.trim().to_string()),
            Value::Object(fields) => ["licenseId", "id", "abbreviation", "name"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .map(|item| item.trim().to_string()),
            _ => None,
        })
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serves `replies` in order, repeating the last one, and counts connections.
    fn serve(replies: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let url = format!("http://{}/licenses.json", listener.local_addr().expect("local addr"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let served = counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&chunk[..read]),
                    }
                }
                let Some(answer) = replies.get(served).or(replies.last()) else { break };
                let _ = stream.write_all(answer.as_bytes());
                let _ = stream.flush();
            }
        });

        (url, hits)
    }

    fn fetcher(max_retries: u32) -> HttpReferenceFetcher {
        HttpReferenceFetcher {
            client: Client::new(),
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let (url, hits) = serve(vec![
            reply("503 Service Unavailable", ""),
            reply("502 Bad Gateway", ""),
            reply("200 OK", r#"{"licenses": [{"licenseId": "MIT"}]}"#),
        ]);

        let items = fetcher(2).fetch("spdx", &url).await.expect("third attempt succeeds");

        assert_eq!(items, vec!["MIT".to_string()]);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let (url, hits) = serve(vec![reply("404 Not Found", "")]);

        match fetcher(3).fetch("spdx", &url).await {
            Err(VocabularyError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_every_retry_fails() {
        let (url, hits) = serve(vec![reply("500 Internal Server Error", "")]);

        match fetcher(2).fetch("spdx", &url).await {
            Err(VocabularyError::Exhausted { name, attempts, reason }) => {
                assert_eq!(name, "spdx");
                assert_eq!(attempts, 3);
                assert!(reason.contains("500"), "reason: {reason}");
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_list_is_a_body_error() {
        let (url, hits) = serve(vec![reply("200 OK", "[]")]);

        assert!(matches!(
            fetcher(2).fetch("spdx", &url).await,
            Err(VocabularyError::Body { .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let delays: Vec<Duration> = backoff_schedule(
            Duration::from_millis(250),
            Duration::from_secs(1),
            5,
        )
        .collect();
        assert_eq!(
            delays,
            [250, 500, 1000, 1000, 1000].map(Duration::from_millis).to_vec()
        );

        assert_eq!(backoff_schedule(Duration::from_secs(9), MAX_BACKOFF, 1).collect::<Vec<_>>(), vec![MAX_BACKOFF]);
        assert_eq!(backoff_schedule(Duration::from_millis(250), MAX_BACKOFF, 0).count(), 0);
    }

    #[test]
    fn parses_spdx_layout() {
        let body = r#"{"licenseListVersion": "3.24", "licenses": [{"licenseId": "MIT"}, {"licenseId": "CC0-1.0"}]}"#;
        assert_eq!(
            parse_reference_list(body),
            Some(vec!["MIT".to_string(), "CC0-1.0".to_string()])
        );
    }

    #[test]
    fn parses_plain_lines_and_string_arrays() {
        assert_eq!(
            parse_reference_list("# media types\ntext/csv\n\napplication/json\n"),
            Some(vec!["text/csv".to_string(), "application/json".to_string()])
        );
        assert_eq!(
            parse_reference_list(r#"["DDI", {"abbreviation": "EML"}]"#),
            Some(vec!["DDI".to_string(), "EML".to_string()])
        );
        assert_eq!(parse_reference_list("[]"), None);
    }
}
