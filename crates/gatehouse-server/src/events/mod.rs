//! Provider dispatch: stage contexts and the four-way decision.
//!
//! Every pipeline stage hands a context to the host-supplied
//! [`ServerProvider`] and classifies the returned [`EventDecision`] the
//! same way: the provider can take over the stage, opt the middleware out
//! of the request, reject it with a protocol error, or fall through to the
//! built-in behavior.

mod contexts;
mod provider;

pub use contexts::{IssueContext, LogoutContext, LogoutResponseContext, ReceiveContext};
pub use provider::{DefaultProvider, ServerProvider};

use crate::error::ProtocolError;

/// Decision returned from every provider stage.
#[derive(Debug)]
pub enum EventDecision<T> {
    /// The provider produced the stage result itself; the pipeline returns
    /// it without running the default behavior. `Handled(None)` and an
    /// empty credential string both collapse to an absent result.
    Handled(Option<T>),

    /// The provider opted out; the pipeline yields nothing and the host
    /// should let the next handler run.
    Skip,

    /// The provider rejected the request; the error is surfaced verbatim.
    Reject(ProtocolError),

    /// Run the default behavior.
    Continue,
}

impl<T> EventDecision<T> {
    /// Shorthand for a handled stage carrying a value.
    pub fn handled(value: impl Into<T>) -> Self {
        Self::Handled(Some(value.into()))
    }
}
