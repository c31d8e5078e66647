//! Request and response models shared by the lifecycle pipelines.

pub(crate) mod logout;
mod request;
mod response;

pub use logout::{EndSessionRequest, EndSessionResponse, LogoutHttpRequest, LogoutHttpResponse};
pub use request::{grant_types, TokenRequest};
pub use response::TokenResponse;
