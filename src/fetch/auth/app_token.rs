use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderValue};

/// Header Socrata portals read the application token from. Unauthenticated
/// requests are throttled much more aggressively.
pub const APP_TOKEN_HEADER: &str = "x-app-token";

/// An [`HttpClient`] wrapper that sends a Socrata application token with
/// every request.
pub struct AppToken<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> AppToken<C> {
    /// Wraps `inner`, failing if `token` cannot be sent as a header value.
    pub fn new(inner: C, token: &str) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for AppToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(HeaderName::from_static(APP_TOKEN_HEADER), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_rejects_token_with_newline() {
        assert!(AppToken::new(BasicClient::new().unwrap(), "abc\ndef").is_err());
    }

    #[test]
    fn test_accepts_plain_token() {
        assert!(AppToken::new(BasicClient::new().unwrap(), "aBcD1234").is_ok());
    }
}
