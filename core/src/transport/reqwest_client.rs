//! Default transport backed by `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::redirect::Policy;
use tokio::task::AbortHandle;

use super::{Completion, DataTask, RawOutcome, Transport};
use crate::error::{NetworkError, TransportErrorKind};
use crate::http::{Header, HttpResponse, TransportRequest};

/// Configuration for the `reqwest` transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Whole-request timeout. Elapsing surfaces as `TimedOut`.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Maximum redirects to follow; `0` disables following.
    pub max_redirects: usize,
    pub user_agent: Option<String>,
    /// Sent with every request, before the request's own headers.
    pub default_headers: Vec<Header>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            connect_timeout: Some(Duration::from_secs(10)),
            max_redirects: 10,
            user_agent: Some(format!("network-service/{}", env!("CARGO_PKG_VERSION"))),
            default_headers: Vec::new(),
        }
    }
}

/// Builder for a [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    config: TransportConfig,
}

impl ReqwestTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    pub fn no_redirects(self) -> Self {
        self.max_redirects(0)
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn default_header(mut self, header: impl Into<Header>) -> Self {
        self.config.default_headers.push(header.into());
        self
    }

    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, NetworkError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        builder = if self.config.max_redirects == 0 {
            builder.redirect(Policy::none())
        } else {
            builder.redirect(Policy::limited(self.config.max_redirects))
        };
        if let Some(ref user_agent) = self.config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let mut default_headers = http::HeaderMap::new();
        for header in &self.config.default_headers {
            let name = http::HeaderName::from_bytes(header.key.as_bytes()).map_err(|e| {
                let message = format!("invalid default header '{}': {e}", header.key);
                NetworkError::InvalidRequest(message)
            })?;
            let value = http::HeaderValue::from_str(&header.value).map_err(|e| {
                NetworkError::InvalidRequest(format!(
                    "invalid value for default header '{}': {e}",
                    header.key
                ))
            })?;
            default_headers.append(name, value);
        }
        builder = builder.default_headers(default_headers);

        let client = builder
            .build()
            .map_err(|e| NetworkError::unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(ReqwestTransport {
            client,
            config: Arc::new(self.config),
        })
    }
}

/// Transport that performs requests with a shared `reqwest::Client`.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: Arc<TransportConfig>,
}

impl ReqwestTransport {
    /// A transport with the default configuration.
    pub fn new() -> Result<Self, NetworkError> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for ReqwestTransport {
    fn data_task(&self, request: TransportRequest, completion: Completion) -> Box<dyn DataTask> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let state = match builder.build() {
            Ok(request) => TaskState::Ready(request),
            Err(err) => TaskState::Invalid(TransportErrorKind::from(err)),
        };

        Box::new(ReqwestTask {
            client: self.client.clone(),
            completion: CompletionSlot::new(completion),
            state: Mutex::new(state),
        })
    }
}

/// Hands the outcome to the completion callback at most once.
#[derive(Clone)]
struct CompletionSlot(Arc<Mutex<Option<Completion>>>);

impl CompletionSlot {
    fn new(completion: Completion) -> Self {
        Self(Arc::new(Mutex::new(Some(completion))))
    }

    fn fire(&self, outcome: RawOutcome) {
        let completion = self.0.lock().take();
        if let Some(completion) = completion {
            completion(outcome);
        }
    }
}

enum TaskState {
    Ready(reqwest::Request),
    Invalid(TransportErrorKind),
    Running(AbortHandle),
    Done,
}

struct ReqwestTask {
    client: reqwest::Client,
    completion: CompletionSlot,
    state: Mutex<TaskState>,
}

impl DataTask for ReqwestTask {
    fn resume(&self) {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, TaskState::Done) {
            TaskState::Ready(request) => {
                let runtime = match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        drop(state);
                        let kind = TransportErrorKind::Other(format!("no async runtime: {err}"));
                        self.completion.fire(Err(kind));
                        return;
                    }
                };
                let client = self.client.clone();
                let completion = self.completion.clone();
                let task = runtime.spawn(async move {
                    completion.fire(execute(client, request).await);
                });
                *state = TaskState::Running(task.abort_handle());
            }
            TaskState::Invalid(kind) => {
                drop(state);
                self.completion.fire(Err(kind));
            }
            previous @ (TaskState::Running(_) | TaskState::Done) => *state = previous,
        }
    }

    fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), TaskState::Done);
        if let TaskState::Running(task) = previous {
            task.abort();
        }
        self.completion.fire(Err(TransportErrorKind::Cancelled));
    }
}

async fn execute(client: reqwest::Client, request: reqwest::Request) -> RawOutcome {
    let response = client.execute(request).await?;
    let status = response.status().as_u16();
    let headers = HttpResponse::headers_from_map(response.headers());
    let body = response.bytes().await?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A completion that records every outcome it receives.
    fn recording() -> (Completion, Arc<Mutex<Vec<RawOutcome>>>) {
        let seen: Arc<Mutex<Vec<RawOutcome>>> = Arc::default();
        let sink = seen.clone();
        let completion: Completion = Box::new(move |outcome: RawOutcome| sink.lock().push(outcome));
        (completion, seen)
    }

    fn task(state: TaskState, completion: Completion) -> ReqwestTask {
        ReqwestTask {
            client: reqwest::Client::new(),
            completion: CompletionSlot::new(completion),
            state: Mutex::new(state),
        }
    }

    fn ready() -> TaskState {
        let request = reqwest::Client::new()
            .get("http://127.0.0.1:9/flocks")
            .build()
            .unwrap();
        TaskState::Ready(request)
    }

    #[test]
    fn cancel_on_ready_task_fires_cancelled_once() {
        let (completion, seen) = recording();
        let task = task(ready(), completion);

        task.cancel();
        task.cancel();

        assert_eq!(*seen.lock(), vec![Err(TransportErrorKind::Cancelled)]);
    }

    #[test]
    fn resume_after_cancel_is_a_no_op() {
        let (completion, seen) = recording();
        let task = task(ready(), completion);

        task.cancel();
        task.resume();

        assert!(matches!(*task.state.lock(), TaskState::Done));
        assert_eq!(*seen.lock(), vec![Err(TransportErrorKind::Cancelled)]);
    }

    #[test]
    fn invalid_request_fails_on_resume() {
        let (completion, seen) = recording();
        let kind = TransportErrorKind::Other("builder error".to_string());
        let task = task(TaskState::Invalid(kind.clone()), completion);
        assert!(seen.lock().is_empty());

        task.resume();
        task.resume();
        task.cancel();

        assert_eq!(*seen.lock(), vec![Err(kind)]);
    }

    #[test]
    fn resume_outside_a_runtime_fails_instead_of_panicking() {
        let (completion, seen) = recording();
        let task = task(ready(), completion);

        task.resume();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0],
            Err(TransportErrorKind::Other(msg)) if msg.starts_with("no async runtime")
        ));
    }

    #[tokio::test]
    async fn cancel_on_running_task_aborts_and_fires_cancelled_once() {
        let (completion, seen) = recording();
        let task = task(ready(), completion);

        task.resume();
        assert!(matches!(*task.state.lock(), TaskState::Running(_)));
        task.cancel();
        // Give an aborted request the chance to report late; it must not.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*seen.lock(), vec![Err(TransportErrorKind::Cancelled)]);
    }

    #[test]
    fn default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.unwrap().starts_with("network-service/"));
    }

    #[test]
    fn builder_applies_settings() {
        let transport = ReqwestTransport::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1))
            .no_redirects()
            .user_agent("birdwatch/1.0")
            .default_header(("X-Client", "tests"))
            .build()
            .unwrap();
        let config = transport.config();
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.max_redirects, 0);
        assert_eq!(config.user_agent.as_deref(), Some("birdwatch/1.0"));
        assert_eq!(config.default_headers, vec![Header::new("X-Client", "tests")]);
    }

    #[test]
    fn builder_rejects_invalid_default_header() {
        let err = ReqwestTransport::builder()
            .default_header(("bad header", "x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn no_timeout_clears_timeout() {
        let transport = ReqwestTransport::builder().no_timeout().build().unwrap();
        assert_eq!(transport.config().timeout, None);
    }
}
