//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use docchat_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    deltas: Vec<String>,
    finish_reason: ModelFinishReason,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn from_preset(preset: &PresetResponse, delay: Duration) -> Self {
        let mut deltas = Vec::new();
        let mut finish_reason = ModelFinishReason::Stop;
        for event in &preset.events {
            match event {
                PresetEvent::MessageDelta(delta) => deltas.push(delta.clone()),
                PresetEvent::Filtered => {
                    finish_reason = ModelFinishReason::ContentFiltered
                }
            }
        }
        Self {
            deltas,
            finish_reason,
            event_idx: 0,
            delay,
            sleep: None,
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < this.deltas.len() {
                let delta = this.deltas[this.event_idx].clone();
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(delta),
                )));
            } else if this.event_idx == this.deltas.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    this.finish_reason,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct SharedState {
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. The n-th request receives the n-th
/// preset response, no matter what it contains. If there are no enough
/// presets in the script, an error will be returned.
///
/// Every received request is recorded and can be inspected with
/// [`TestModelProvider::requests`]. Clones share the same call counter and
/// request log.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    state: Arc<SharedState>,
}

impl TestModelProvider {
    /// Appends a preset response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Sets the delay before each response event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests have been sent so far.
    #[inline]
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        match self.state.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn model_name(&self) -> &str {
        "test-model"
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let step_idx = self.state.calls.fetch_add(1, Ordering::SeqCst);
        match self.state.requests.lock() {
            Ok(mut requests) => requests.push(req.clone()),
            Err(poisoned) => poisoned.into_inner().push(req.clone()),
        }

        let result = match self.script.get(step_idx) {
            None => Err(Error {
                message: "no enough steps",
                kind: ErrorKind::RateLimitExceeded,
            }),
            Some(PresetResponse {
                failure: Some(kind),
                ..
            }) => Err(Error {
                message: "scripted failure",
                kind: *kind,
            }),
            Some(preset) => Ok(TestModelResponse::from_preset(
                preset,
                self.delay.unwrap_or(Duration::from_millis(1)),
            )),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use docchat_model::{Blob, Part};

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, ModelFinishReason) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
                .unwrap()
                .unwrap();
            match event {
                ModelResponseEvent::Completed(reason) => return (msg, reason),
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
            }
        }
    }

    fn drawing_request(question: &str) -> ModelRequest {
        ModelRequest {
            parts: vec![
                Part::Text("Review this drawing.".to_owned()),
                Part::Blob(Blob {
                    mime_type: "image/png".to_owned(),
                    data: Bytes::from_static(b"\x89PNG"),
                }),
                Part::Text(question.to_owned()),
            ],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Two dimensions ".to_owned()),
            PresetEvent::MessageDelta("are missing.".to_owned()),
        ]));
        provider.add_response(PresetResponse::with_text("IT7."));

        let resp = provider
            .send_request(&drawing_request("Check it"))
            .await
            .unwrap();
        let (msg, reason) = collect_response(resp).await;
        assert_eq!(msg, "Two dimensions are missing.");
        assert_eq!(reason, ModelFinishReason::Stop);

        let resp = provider
            .send_request(&drawing_request("Which tolerance?"))
            .await
            .unwrap();
        let (msg, _) = collect_response(resp).await;
        assert_eq!(msg, "IT7.");

        assert_eq!(provider.call_count(), 2);
        let requests = provider.requests();
        assert_eq!(requests[1], drawing_request("Which tolerance?"));
    }

    #[tokio::test]
    async fn test_scripted_failure_and_exhaustion() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::failing(ErrorKind::Network));

        let err = provider
            .send_request(&drawing_request("Hi"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Network);

        let err = provider
            .send_request(&drawing_request("Hi again"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_filtered_response() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::Filtered,
        ]));

        let resp = provider
            .send_request(&drawing_request("Hi"))
            .await
            .unwrap();
        let (msg, reason) = collect_response(resp).await;
        assert!(msg.is_empty());
        assert_eq!(reason, ModelFinishReason::ContentFiltered);
    }
}
