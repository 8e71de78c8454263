//! Request context passed into flag evaluation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Who is asking, from where, and in which environment.
///
/// Purely a value: it is built per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_role: Option<String>,
    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
    pub environment: String,
}

impl RequestContext {
    /// Creates an anonymous context for the given environment.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_user_role(mut self, user_role: impl Into<String>) -> Self {
        self.user_role = Some(user_role.into());
        self
    }

    /// Adds a single attribute, creating the attribute map if needed.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Identifier used for percentage bucketing: user id, else session id.
    pub fn bucketing_id(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.session_id.as_deref())
    }
}
