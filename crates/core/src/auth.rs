//! Authentication headers for EMR requests.
//!
//! The EMR client does not know how a user authenticated; it asks an [`AuthProvider`] for the
//! headers to attach to every request.

use crate::config::EmrConfig;
use crate::constants::SESSION_COOKIE_NAME;
use crate::{ClinicError, ClinicResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use std::fmt;
use std::sync::Arc;

/// Source of the authentication headers attached to EMR requests.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    fn headers(&self) -> ClinicResult<HeaderMap>;
}

/// HTTP Basic credentials.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AuthProvider for BasicAuth {
    fn headers(&self) -> ClinicResult<HeaderMap> {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| ClinicError::InvalidHeader(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// An existing OpenMRS session (`JSESSIONID`).
#[derive(Clone)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self(session_id.into())
    }

    /// The session a `Set-Cookie` header opens, if it names `JSESSIONID`.
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let value = value.trim().trim_matches('"');
        (name.trim() == SESSION_COOKIE_NAME && !value.is_empty()).then(|| Self::new(value))
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCookie(<redacted>)")
    }
}

impl AuthProvider for SessionCookie {
    fn headers(&self) -> ClinicResult<HeaderMap> {
        let mut value = HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={}", self.0))
            .map_err(|e| ClinicError::InvalidHeader(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value);
        Ok(headers)
    }
}

/// No authentication; the EMR will answer 401 for protected resources.
#[derive(Clone, Debug, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn headers(&self) -> ClinicResult<HeaderMap> {
        Ok(HeaderMap::new())
    }
}

/// Pick a provider from configuration: credentials, then session cookie, then none.
pub fn auth_from_config(config: &EmrConfig) -> Arc<dyn AuthProvider> {
    if let Some(credentials) = config.credentials() {
        return Arc::new(BasicAuth::new(
            credentials.username.clone(),
            credentials.password.clone(),
        ));
    }
    if let Some(session_id) = config.session_id() {
        return Arc::new(SessionCookie::new(session_id));
    }
    Arc::new(NoAuth)
}
