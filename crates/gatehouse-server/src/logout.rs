//! End-session (RP-initiated logout) pipeline.
//!
//! The request walks Parse → Extract → Validate → Handle → Apply. The
//! three middle stages dispatch the provider and classify its decision the
//! same way as the token pipelines; a rejection at any stage short-circuits
//! to Apply carrying the protocol error. Parse failures (wrong method,
//! wrong content type, malformed parameters) jump to Apply as
//! `invalid_request`.

use std::sync::Arc;

use http::{Method, StatusCode};

use crate::error::ProtocolError;
use crate::events::{EventDecision, LogoutContext, LogoutResponseContext};
use crate::models::logout::POST_LOGOUT_REDIRECT_URI;
use crate::models::{
    EndSessionRequest, EndSessionResponse, LogoutHttpRequest, LogoutHttpResponse,
};
use crate::options::ServerOptions;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Input caps; oversized parameters are rejected before any dispatch.
const MAX_ID_TOKEN_HINT_LENGTH: usize = 8192;
const MAX_STATE_LENGTH: usize = 512;
const MAX_REDIRECT_URI_LENGTH: usize = 2048;

/// How the pipeline left the request.
#[derive(Debug)]
pub enum LogoutDisposition {
    /// The pipeline rendered a response for the front-end to write.
    Response(LogoutHttpResponse),

    /// A provider produced the response itself; nothing left to write.
    ProviderHandled,

    /// The request was not handled here; the host should run the next
    /// handler. Carries the response state (including any error, when the
    /// application displays errors itself).
    Passthrough(EndSessionResponse),
}

/// The end-session request pipeline.
pub struct LogoutPipeline {
    options: Arc<ServerOptions>,
}

enum StageFlow {
    Complete(LogoutDisposition),
    Error(ProtocolError),
    Proceed,
}

impl LogoutPipeline {
    /// Create a pipeline over shared options.
    #[must_use]
    pub fn new(options: Arc<ServerOptions>) -> Self {
        Self { options }
    }

    /// Drive a logout request through the pipeline.
    pub async fn process(&self, http: &LogoutHttpRequest) -> LogoutDisposition {
        let mut request: Option<EndSessionRequest> = None;
        let mut response = EndSessionResponse::default();

        match self.run_stages(http, &mut request, &mut response).await {
            StageFlow::Complete(disposition) => return disposition,
            StageFlow::Error(error) => response.error = Some(error),
            StageFlow::Proceed => {}
        }

        self.apply(request.as_ref(), response).await
    }

    /// Parse → Extract → Validate → Handle.
    async fn run_stages(
        &self,
        http: &LogoutHttpRequest,
        request_slot: &mut Option<EndSessionRequest>,
        response: &mut EndSessionResponse,
    ) -> StageFlow {
        let provider = &self.options.provider;

        // Parse: GET carries query parameters, POST a form body.
        let raw = if http.method == Method::GET {
            Some(http.query.as_str())
        } else if http.method == Method::POST && is_form_content_type(http.content_type.as_deref())
        {
            Some(http.body.as_str())
        } else {
            None
        };
        let Some(raw) = raw else {
            tracing::debug!(method = %http.method, "Rejecting logout request with unsupported shape");
            return StageFlow::Error(ProtocolError::invalid_request(
                "Logout requests must use GET or a form-encoded POST",
            ));
        };

        let parsed: EndSessionRequest = match serde_urlencoded::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                return StageFlow::Error(ProtocolError::invalid_request(format!(
                    "Malformed logout parameters: {e}"
                )));
            }
        };

        // The request is stored before any classification so downstream
        // observers see it even when a stage rejects.
        let request = &*request_slot.insert(parsed);

        if let Some(error) = oversized_parameter(request) {
            return StageFlow::Error(error);
        }

        match provider.extract_logout_request(&LogoutContext { request }).await {
            EventDecision::Handled(_) => {
                return StageFlow::Complete(LogoutDisposition::ProviderHandled)
            }
            EventDecision::Skip => {
                return StageFlow::Complete(LogoutDisposition::Passthrough(std::mem::take(
                    response,
                )))
            }
            EventDecision::Reject(error) => return StageFlow::Error(error),
            EventDecision::Continue => {}
        }

        match provider.validate_logout_request(&LogoutContext { request }).await {
            EventDecision::Handled(_) => {
                return StageFlow::Complete(LogoutDisposition::ProviderHandled)
            }
            EventDecision::Skip => {
                return StageFlow::Complete(LogoutDisposition::Passthrough(std::mem::take(
                    response,
                )))
            }
            EventDecision::Reject(error) => return StageFlow::Error(error),
            EventDecision::Continue => {}
        }

        // Seed the response for the default rendering; providers may add
        // or replace parameters in the Handle stage.
        if let Some(uri) = &request.post_logout_redirect_uri {
            response.set_parameter(POST_LOGOUT_REDIRECT_URI, uri.clone());
        }
        if let Some(state) = &request.state {
            response.set_parameter("state", state.clone());
        }

        let mut ctx = LogoutResponseContext {
            request: Some(request),
            response: &mut *response,
        };
        match provider.handle_logout_request(&mut ctx).await {
            EventDecision::Handled(_) => {
                StageFlow::Complete(LogoutDisposition::ProviderHandled)
            }
            EventDecision::Skip => StageFlow::Complete(LogoutDisposition::Passthrough(
                std::mem::take(response),
            )),
            EventDecision::Reject(error) => StageFlow::Error(error),
            EventDecision::Continue => StageFlow::Proceed,
        }
    }

    /// Apply: final provider say, then the default rendering.
    async fn apply(
        &self,
        request: Option<&EndSessionRequest>,
        mut response: EndSessionResponse,
    ) -> LogoutDisposition {
        let mut ctx = LogoutResponseContext {
            request,
            response: &mut response,
        };
        match self.options.provider.apply_logout_response(&mut ctx).await {
            EventDecision::Handled(_) => return LogoutDisposition::ProviderHandled,
            EventDecision::Skip => return LogoutDisposition::Passthrough(response),
            EventDecision::Reject(error) => response.error = Some(error),
            EventDecision::Continue => {}
        }

        if let Some(error) = response.error.clone() {
            if self.options.application_can_display_errors {
                // The host renders its own error page from the response state.
                return LogoutDisposition::Passthrough(response);
            }
            return LogoutDisposition::Response(LogoutHttpResponse {
                status: StatusCode::BAD_REQUEST,
                redirect: None,
                body: Some(render_error_page(&error)),
            });
        }

        let Some(redirect_uri) = response.post_logout_redirect_uri().map(String::from) else {
            return LogoutDisposition::Response(LogoutHttpResponse {
                status: StatusCode::OK,
                redirect: None,
                body: None,
            });
        };

        let mut url = match url::Url::parse(&redirect_uri) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "post_logout_redirect_uri is not a valid URL; not redirecting");
                return LogoutDisposition::Response(LogoutHttpResponse {
                    status: StatusCode::OK,
                    redirect: None,
                    body: None,
                });
            }
        };

        let appended: Vec<(&str, &str)> = response
            .parameters
            .iter()
            .filter(|(name, _)| name.as_str() != POST_LOGOUT_REDIRECT_URI)
            .filter_map(|(name, value)| match value.as_str() {
                Some(text) => Some((name.as_str(), text)),
                None => {
                    tracing::warn!(
                        parameter = %name,
                        "Skipping non-string logout response parameter"
                    );
                    None
                }
            })
            .collect();
        if !appended.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in appended {
                pairs.append_pair(name, value);
            }
        }

        LogoutDisposition::Response(LogoutHttpResponse {
            status: StatusCode::SEE_OTHER,
            redirect: Some(url.to_string()),
            body: None,
        })
    }
}

/// Content-type prefix match, case-insensitive, charset suffix allowed.
fn is_form_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct.as_bytes()
            .get(..FORM_CONTENT_TYPE.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FORM_CONTENT_TYPE.as_bytes()))
    })
}

/// Reject over-long inputs before they reach any provider.
fn oversized_parameter(request: &EndSessionRequest) -> Option<ProtocolError> {
    if request
        .id_token_hint
        .as_ref()
        .is_some_and(|v| v.len() > MAX_ID_TOKEN_HINT_LENGTH)
    {
        return Some(ProtocolError::invalid_request("id_token_hint too large"));
    }
    if request
        .state
        .as_ref()
        .is_some_and(|v| v.len() > MAX_STATE_LENGTH)
    {
        return Some(ProtocolError::invalid_request("state parameter too large"));
    }
    if request
        .post_logout_redirect_uri
        .as_ref()
        .is_some_and(|v| v.len() > MAX_REDIRECT_URI_LENGTH)
    {
        return Some(ProtocolError::invalid_request(
            "post_logout_redirect_uri too large",
        ));
    }
    None
}

/// Minimal built-in error page.
fn render_error_page(error: &ProtocolError) -> String {
    let description = error
        .error_description
        .as_deref()
        .unwrap_or("The logout request could not be processed.");
    format!(
        "<!DOCTYPE html>\n<html><head><title>Logout error</title></head><body>\
         <h1>{}</h1><p>{}</p></body></html>",
        html_escape(&error.error),
        html_escape(description)
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
