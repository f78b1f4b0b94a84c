//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Services never read process-wide environment variables during
//! request handling; binaries call [`EmrConfig::from_lookup`] with `std::env::var` and hand the
//! result down.

use crate::constants::{
    DEFAULT_LAB_ORDER_TYPE_UUID, ENV_FHIR_BASE_URL, ENV_LAB_ORDER_TYPE_UUID, ENV_LOCATION_UUID,
    ENV_PASSWORD, ENV_REST_BASE_URL, ENV_SESSION_ID, ENV_USERNAME,
};
use crate::{ClinicError, ClinicResult};
use clinic_types::EmrUuid;
use std::fmt;

/// Basic credentials for the EMR.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// EMR configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EmrConfig {
    rest_base_url: String,
    fhir_base_url: String,
    location_uuid: Option<EmrUuid>,
    credentials: Option<Credentials>,
    session_id: Option<String>,
    lab_order_type_uuid: EmrUuid,
}

impl EmrConfig {
    /// Create a new `EmrConfig` from the two EMR base URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] if either URL does not parse or is not http/https.
    pub fn new(rest_base_url: &str, fhir_base_url: &str) -> ClinicResult<Self> {
        let lab_order_type_uuid = EmrUuid::parse(DEFAULT_LAB_ORDER_TYPE_UUID)
            .map_err(|e| ClinicError::Config(e.to_string()))?;

        Ok(Self {
            rest_base_url: normalise_base_url(ENV_REST_BASE_URL, rest_base_url)?,
            fhir_base_url: normalise_base_url(ENV_FHIR_BASE_URL, fhir_base_url)?,
            location_uuid: None,
            credentials: None,
            session_id: None,
            lab_order_type_uuid,
        })
    }

    pub fn with_location(mut self, location_uuid: EmrUuid) -> Self {
        self.location_uuid = Some(location_uuid);
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some(Credentials { username, password });
        self
    }

    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_lab_order_type(mut self, order_type_uuid: EmrUuid) -> Self {
        self.lab_order_type_uuid = order_type_uuid;
        self
    }

    /// Build a configuration from a key lookup (normally `|k| std::env::var(k).ok()`).
    ///
    /// Blank values are treated as unset. Values are trimmed, except the password, which is taken
    /// as given. Credentials are only used when both the username and the password are present.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] if a required URL is missing or any value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClinicResult<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secret = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| {
            value(key).ok_or_else(|| ClinicError::Config(format!("{key} must be set")))
        };

        let mut config = Self::new(
            &required(ENV_REST_BASE_URL)?,
            &required(ENV_FHIR_BASE_URL)?,
        )?;

        if let Some(location) = value(ENV_LOCATION_UUID) {
            config = config.with_location(parse_config_id(ENV_LOCATION_UUID, &location)?);
        }
        if let Some(order_type) = value(ENV_LAB_ORDER_TYPE_UUID) {
            config =
                config.with_lab_order_type(parse_config_id(ENV_LAB_ORDER_TYPE_UUID, &order_type)?);
        }
        match (value(ENV_USERNAME), secret(ENV_PASSWORD)) {
            (Some(username), Some(password)) => {
                config = config.with_credentials(username, password);
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ClinicError::Config(format!(
                    "{ENV_USERNAME} and {ENV_PASSWORD} must be set together"
                )));
            }
            (None, None) => {}
        }
        if let Some(session_id) = value(ENV_SESSION_ID) {
            config = config.with_session_id(session_id);
        }

        Ok(config)
    }

    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }

    pub fn fhir_base_url(&self) -> &str {
        &self.fhir_base_url
    }

    /// Absolute URL of a REST resource path such as `order/{uuid}`.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/{}", self.rest_base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL of a FHIR resource path such as `MedicationRequest/{id}`.
    pub fn fhir_url(&self, path: &str) -> String {
        format!("{}/{}", self.fhir_base_url, path.trim_start_matches('/'))
    }

    pub fn location_uuid(&self) -> Option<&EmrUuid> {
        self.location_uuid.as_ref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn lab_order_type_uuid(&self) -> &EmrUuid {
        &self.lab_order_type_uuid
    }
}

fn normalise_base_url(name: &str, value: &str) -> ClinicResult<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ClinicError::Config(format!("{name} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClinicError::Config(format!(
            "{name} must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ClinicError::Config(format!(
            "{name} must not contain a query or fragment"
        )));
    }

    Ok(trimmed.to_string())
}

fn parse_config_id(name: &str, value: &str) -> ClinicResult<EmrUuid> {
    EmrUuid::parse(value).map_err(|e| ClinicError::Config(format!("{name}: {e}")))
}
