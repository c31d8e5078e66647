//! Issue and redeem pipelines.

mod issuer;
mod receiver;

pub use issuer::TokenIssuer;
pub use receiver::TokenReceiver;
