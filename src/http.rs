use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("reelshelf/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub attempts: usize,
    pub retry_delay: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(4),
            read_timeout: Duration::from_secs(8),
            attempts: 1,
            retry_delay: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status}{}", format_body(.body))]
    Status { status: u16, body: String },
    #[error("HTTP status {status}{} after {attempts} attempt(s)", format_body(.body))]
    StatusExhausted {
        status: u16,
        body: String,
        attempts: usize,
    },
    #[error("transport error after {attempts} attempt(s): {message}")]
    Transport { message: String, attempts: usize },
    #[error("response decode failed: {0}")]
    Body(String),
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({body})")
    }
}

/// Rate limiting (429) is surfaced to the caller, never re-issued.
fn should_retry_http_status(status: u16) -> bool {
    status == 408 || (500..=599).contains(&status)
}

pub(crate) fn get_text_with_retries(
    url: &str,
    query: &[(&str, &str)],
    options: &HttpOptions,
) -> Result<String, FetchError> {
    let attempts = options.attempts.max(1);
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(options.connect_timeout)
        .timeout_read(options.read_timeout)
        .timeout_write(options.read_timeout)
        .user_agent(USER_AGENT)
        .build();

    let mut attempt = 1;
    loop {
        let mut request = agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        debug!(url, attempt, "issuing GET");

        match request.call() {
            Ok(response) => {
                return response
                    .into_string()
                    .map_err(|err| FetchError::Body(err.to_string()));
            }
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                let body = response_body.trim().chars().take(240).collect::<String>();

                if !should_retry_http_status(status) {
                    return Err(FetchError::Status { status, body });
                }
                if attempt >= attempts {
                    return Err(FetchError::StatusExhausted {
                        status,
                        body,
                        attempts,
                    });
                }
                warn!(url, status, attempt, "retryable HTTP status");
            }
            Err(ureq::Error::Transport(err)) => {
                if attempt >= attempts {
                    return Err(FetchError::Transport {
                        message: err.to_string(),
                        attempts,
                    });
                }
                warn!(url, attempt, error = %err, "transport error, retrying");
            }
        }

        attempt += 1;
        thread::sleep(options.retry_delay);
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{Behavior, TestServer};
    use super::*;

    fn fast_options(attempts: usize) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
            attempts,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(500, "server-error".to_string()),
            Behavior::Respond(408, "timeout".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &fast_options(3));

        assert_eq!(result.expect("should eventually succeed"), "ok");
        assert_eq!(server.request_count(), 3);
    }

    #[test]
    fn does_not_retry_client_errors() {
        let server = TestServer::spawn(vec![Behavior::Respond(401, "bad key".to_string())]);

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &fast_options(5));

        let err = result.expect_err("401 should not be retried");
        assert!(
            matches!(err, FetchError::Status { status: 401, .. }),
            "unexpected error: {err}"
        );
        assert!(err.to_string().contains("bad key"));
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn rate_limited_status_is_not_retried() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(429, "throttled".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &fast_options(3));

        let err = result.expect_err("429 should be reported");
        assert!(
            matches!(err, FetchError::Status { status: 429, .. }),
            "unexpected error: {err}"
        );
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn default_options_make_a_single_attempt() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let options = HttpOptions {
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
            ..HttpOptions::default()
        };

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &options);

        assert!(result.is_err());
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn retries_read_timeout_and_recovers() {
        let server = TestServer::spawn(vec![
            Behavior::DelayRespond(Duration::from_millis(120), 200, "slow".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let options = HttpOptions {
            connect_timeout: Duration::from_millis(250),
            read_timeout: Duration::from_millis(20),
            attempts: 2,
            retry_delay: Duration::from_millis(1),
        };

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &options);

        assert_eq!(result.expect("timeout should be retried"), "ok");
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn reports_exhausted_retries_for_retryable_status() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(503, "still-down".to_string()),
        ]);

        let result = get_text_with_retries(&server.base_url, &[("s", "x")], &fast_options(2));

        let err = result.expect_err("retryable failures should eventually error");
        let message = err.to_string();
        assert!(
            message.contains("after 2 attempt(s)") && message.contains("HTTP status 503"),
            "unexpected error message: {message}"
        );
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn sends_query_parameters() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "{}".to_string())]);

        get_text_with_retries(
            &server.base_url,
            &[("s", "dark knight"), ("page", "1")],
            &fast_options(1),
        )
        .expect("request should succeed");

        let lines = server.request_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("s=dark+knight") || lines[0].contains("s=dark%20knight"));
        assert!(lines[0].contains("page=1"));
    }
}
