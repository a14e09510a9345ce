use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while retrieving the feed.
///
/// Only [`FetchError::Request`] and [`FetchError::Body`] are transport
/// failures and therefore retried; everything else ends the fetch at once.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure before a response arrived
    #[error("Error fetching URL '{url}'")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },
    /// The response started but its body could not be read in full
    #[error("Error reading response body from URL '{url}'")]
    Body {
        url: String,
        #[source]
        source: BoxError,
    },
    /// Transport succeeded with a status other than 200
    #[error("Non-200 status code {status} fetching URL '{url}': {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    /// Response body exceeded the configured size limit
    #[error("Response from URL '{url}' exceeds {limit} bytes")]
    ResponseTooLarge { url: String, limit: usize },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Request { .. } | FetchError::Body { .. })
    }
}

/// A response whose body was read in full, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One GET attempt. Implementations must not retry on their own.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpTransport {
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self::with_client(client, max_body_bytes))
    }

    pub fn with_client(client: reqwest::Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                source: e.into(),
            })?;

        let status = response.status().as_u16();
        let body = read_limited_bytes(url, response, self.max_body_bytes).await?;

        Ok(FetchedResponse { status, body })
    }
}

async fn read_limited_bytes(
    url: &str,
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let too_large = || FetchError::ResponseTooLarge {
        url: url.to_string(),
        limit,
    };

    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(too_large());
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: e.into(),
        })?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Retrying GET governed by a fixed backoff schedule.
///
/// The schedule's length is the number of attempts. After a failed attempt
/// `n` the fetcher sleeps `schedule[n]` before trying again; the final
/// attempt's error is returned without sleeping.
#[derive(Debug, Clone)]
pub struct Fetcher<T> {
    transport: T,
    schedule: Vec<Duration>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, schedule: Vec<Duration>) -> Self {
        Self {
            transport,
            schedule,
        }
    }

    /// Fetches `url`, retrying transport failures only.
    ///
    /// Any status code ends the loop; status checking is left to the caller
    /// (see [`Fetcher::fetch_ok`]).
    ///
    /// # Errors
    ///
    /// - The last [`FetchError::Request`] / [`FetchError::Body`] once every
    ///   scheduled attempt has failed
    /// - [`FetchError::ResponseTooLarge`] immediately
    pub async fn fetch_with_retries(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        let attempts = self.schedule.len();
        let mut last_error = None;

        for (attempt, backoff) in self.schedule.iter().enumerate() {
            match self.transport.get(url).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_transport() => return Err(e),
                Err(e) => {
                    if attempt + 1 < attempts {
                        tracing::warn!(
                            url = %url,
                            attempt = attempt + 1,
                            error = %error_chain(&e),
                            backoff = ?backoff,
                            "Request error, retrying"
                        );
                        tokio::time::sleep(*backoff).await;
                    } else {
                        tracing::warn!(
                            url = %url,
                            attempt = attempt + 1,
                            error = %error_chain(&e),
                            "Request error, no retries left"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        // An empty schedule makes no attempt at all; surface that as a request error.
        Err(last_error.unwrap_or_else(|| FetchError::Request {
            url: url.to_string(),
            source: "backoff schedule is empty".into(),
        }))
    }

    /// Like [`Fetcher::fetch_with_retries`], but only a 200 response counts.
    ///
    /// A non-200 response is not retried.
    pub async fn fetch_ok(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.fetch_with_retries(url).await?;

        if response.status != 200 {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        Ok(response.body)
    }
}

fn error_chain(err: &FetchError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
