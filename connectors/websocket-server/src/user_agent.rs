use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{self, HeaderMapExt};

/// The client's `User-Agent`, if it sent one. Never rejects the request.
pub struct OptionalUserAgent(pub Option<String>);

impl OptionalUserAgent {
    pub fn label(&self) -> &str { self.0.as_deref().unwrap_or("Unknown client") }
}

impl<S> FromRequestParts<S> for OptionalUserAgent
where S: Send + Sync
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.headers.typed_get::<headers::UserAgent>().map(|user_agent| user_agent.to_string())))
    }
}
