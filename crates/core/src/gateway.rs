//! The boundary to the remote model.

use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;

use docchat_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use thiserror::Error;
use tracing::Instrument;

/// Why a generation call failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No credential is configured.
    #[error("no API key is configured")]
    AuthMissing,
    /// The call did not finish within the configured timeout.
    #[error("the model did not answer in time")]
    Timeout,
    /// The remote model answered with an error or an unusable response.
    #[error("the model request failed: {0}")]
    RemoteFailure(String),
    /// The remote endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),
}

impl GatewayError {
    fn from_provider(err: &dyn ModelProviderError) -> Self {
        match err.kind() {
            ErrorKind::Timeout => GatewayError::Timeout,
            ErrorKind::Network => GatewayError::Network(err.to_string()),
            ErrorKind::RateLimitExceeded
            | ErrorKind::Moderated
            | ErrorKind::Other => GatewayError::RemoteFailure(err.to_string()),
        }
    }
}

type GenerateResult = Result<String, GatewayError>;
type BoxedGenerateFuture = Pin<Box<dyn Future<Output = GenerateResult> + Send>>;
type HandlerFn = Arc<dyn Fn(&ModelRequest) -> BoxedGenerateFuture + Send + Sync>;

/// The single boundary to the remote model.
///
/// Wraps a model provider behind a type-erased interface, collects the
/// streamed response into one string and maps provider failures onto
/// [`GatewayError`]. Each call issues exactly one request, with no retry.
#[derive(Clone)]
pub struct Gateway {
    handler_fn: Option<HandlerFn>,
    model_name: Arc<str>,
    timeout: Option<Duration>,
}

impl Gateway {
    /// Creates a gateway sending every request to `provider`.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let model_name: Arc<str> = Arc::from(provider.model_name());
        // We have to erase the type `P`, since `Gateway` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: &ModelRequest| -> BoxedGenerateFuture {
                let fut = provider.send_request(req);
                Box::pin(
                    async move {
                        let resp_or_err = fut.await;
                        handle_response::<P>(resp_or_err).await
                    }
                    .instrument(trace_span!("gateway request")),
                )
            },
        );
        Self {
            handler_fn: Some(handler_fn),
            model_name,
            timeout: None,
        }
    }

    /// A gateway for when no credential is available. Every call fails with
    /// [`GatewayError::AuthMissing`].
    pub fn without_credential() -> Self {
        Self {
            handler_fn: None,
            model_name: Arc::from(""),
            timeout: None,
        }
    }

    /// Bounds every call. A call running longer resolves as
    /// [`GatewayError::Timeout`].
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether calls can reach the model at all.
    #[inline]
    pub fn has_credential(&self) -> bool {
        self.handler_fn.is_some()
    }

    /// Name of the model behind this gateway, empty without a credential.
    #[inline]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Sends `req` and waits for the complete answer.
    pub async fn generate(&self, req: &ModelRequest) -> GenerateResult {
        let Some(handler_fn) = &self.handler_fn else {
            warn!("generation requested without a credential");
            return Err(GatewayError::AuthMissing);
        };

        debug!(
            model = %self.model_name,
            parts = req.parts.len(),
            "sending generation request"
        );
        let fut = handler_fn(req);
        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout),
            },
            None => fut.await,
        };

        match &result {
            Ok(text) => debug!(chars = text.len(), "generation finished"),
            Err(err) => error!("generation failed: {err}"),
        }
        result
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> GenerateResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(GatewayError::from_provider(&err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(GatewayError::from_provider(&err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason)
            }
        }
    }

    if finish_reason == Some(ModelFinishReason::ContentFiltered) {
        return Err(GatewayError::RemoteFailure(
            "the response was blocked by the provider's safety filters"
                .to_owned(),
        ));
    }
    if text.trim().is_empty() {
        return Err(GatewayError::RemoteFailure(
            "the model returned an empty response".to_owned(),
        ));
    }
    if finish_reason == Some(ModelFinishReason::Length) {
        warn!("response was cut off at the output token limit");
    }

    Ok(text)
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("model_name", &self.model_name)
            .field("has_credential", &self.has_credential())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use docchat_model::Part;
    use docchat_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            parts: vec![Part::Text("Check the drawing.".to_owned())],
        }
    }

    #[tokio::test]
    async fn test_collects_deltas() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Missing ".to_owned()),
            PresetEvent::MessageDelta("dimensions.".to_owned()),
        ]));
        let gateway = Gateway::new(provider.clone());

        assert_eq!(gateway.model_name(), "test-model");
        let text = gateway.generate(&request()).await.unwrap();
        assert_eq!(text, "Missing dimensions.");
        assert_eq!(provider.requests(), vec![request()]);
    }

    #[tokio::test]
    async fn test_maps_provider_errors() {
        let cases = [
            (ErrorKind::Timeout, "timeout"),
            (ErrorKind::Network, "network"),
            (ErrorKind::RateLimitExceeded, "remote"),
            (ErrorKind::Moderated, "remote"),
            (ErrorKind::Other, "remote"),
        ];
        for (kind, expected) in cases {
            let mut provider = TestModelProvider::default();
            provider.add_response(PresetResponse::failing(kind));
            let err = Gateway::new(provider)
                .generate(&request())
                .await
                .unwrap_err();
            let actual = match err {
                GatewayError::Timeout => "timeout",
                GatewayError::Network(_) => "network",
                GatewayError::RemoteFailure(_) => "remote",
                GatewayError::AuthMissing => "auth",
            };
            assert_eq!(actual, expected, "{kind:?}");
        }
    }

    #[tokio::test]
    async fn test_without_credential() {
        let gateway = Gateway::without_credential();
        assert!(!gateway.has_credential());
        assert_eq!(
            gateway.generate(&request()).await,
            Err(GatewayError::AuthMissing)
        );
    }

    #[tokio::test]
    async fn test_empty_and_filtered_responses_fail() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("   "));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("partial".to_owned()),
            PresetEvent::Filtered,
        ]));
        let gateway = Gateway::new(provider);

        for _ in 0..2 {
            let err = gateway.generate(&request()).await.unwrap_err();
            assert!(matches!(err, GatewayError::RemoteFailure(_)), "{err:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("too late"));
        provider.set_delay(Duration::from_secs(60));
        let gateway =
            Gateway::new(provider).with_timeout(Duration::from_secs(5));

        assert_eq!(
            gateway.generate(&request()).await,
            Err(GatewayError::Timeout)
        );
    }
}
