//! Context Extraction
//!
//! Builds a [`RequestContext`] from ambient request state. The engine never
//! reads transport state itself; the interception layer hands it a
//! [`ContextSource`] or uses the axum extractor below.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::models::RequestContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

// == Context Source ==
/// Where the interception layer gets the caller's identity from.
pub trait ContextSource {
    fn user_id(&self) -> Option<String>;
    fn session_id(&self) -> Option<String>;
    fn ip_address(&self) -> Option<String>;
    fn user_role(&self) -> Option<String> {
        None
    }
    /// Name of the active environment
    fn environment(&self) -> String;
}

impl RequestContext {
    pub fn from_source(source: &impl ContextSource) -> Self {
        Self {
            user_id: source.user_id(),
            session_id: source.session_id(),
            ip_address: source.ip_address(),
            user_role: source.user_role(),
            attributes: None,
            environment: source.environment(),
        }
    }
}

// == Active Environment ==
/// Environment name the running process serves, held in router state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEnvironment(pub String);

// == HTTP Context Source ==
/// Reads identity headers and the peer address from HTTP request parts.
pub struct HttpContextSource<'a> {
    parts: &'a Parts,
    environment: &'a str,
}

impl<'a> HttpContextSource<'a> {
    pub fn new(parts: &'a Parts, environment: &'a str) -> Self {
        Self { parts, environment }
    }

    fn header(&self, name: &str) -> Option<String> {
        self.parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl ContextSource for HttpContextSource<'_> {
    fn user_id(&self) -> Option<String> {
        self.header(USER_ID_HEADER)
    }

    fn session_id(&self) -> Option<String> {
        self.header(SESSION_ID_HEADER)
    }

    /// First `X-Forwarded-For` hop, else the socket peer address.
    fn ip_address(&self) -> Option<String> {
        let forwarded = self.header(FORWARDED_FOR_HEADER).and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find(|hop| !hop.is_empty())
                .map(str::to_string)
        });

        forwarded.or_else(|| {
            self.parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
    }

    fn user_role(&self) -> Option<String> {
        self.header(USER_ROLE_HEADER)
    }

    fn environment(&self) -> String {
        self.environment.to_string()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    ActiveEnvironment: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ActiveEnvironment(environment) = ActiveEnvironment::from_ref(state);
        Ok(RequestContext::from_source(&HttpContextSource::new(
            parts,
            &environment,
        )))
    }
}
