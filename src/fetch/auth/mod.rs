//! Request decorators that attach portal credentials.

mod app_token;

pub use app_token::AppToken;
