//! Constants used throughout the clinic core crate.
//!
//! This module contains the environment variable names, EMR paths and defaults so they are
//! defined in one place.

/// Environment variable holding the OpenMRS REST base URL (`.../ws/rest/v1`).
pub const ENV_REST_BASE_URL: &str = "EMR_REST_BASE_URL";

/// Environment variable holding the OpenMRS FHIR base URL (`.../ws/fhir2/R4`).
pub const ENV_FHIR_BASE_URL: &str = "EMR_FHIR_BASE_URL";

/// Environment variable holding the default clinic location.
pub const ENV_LOCATION_UUID: &str = "EMR_LOCATION_UUID";

pub const ENV_USERNAME: &str = "EMR_USERNAME";
pub const ENV_PASSWORD: &str = "EMR_PASSWORD";

/// Environment variable holding an existing `JSESSIONID`, used when no credentials are set.
pub const ENV_SESSION_ID: &str = "EMR_SESSION_ID";

pub const ENV_LAB_ORDER_TYPE_UUID: &str = "EMR_LAB_ORDER_TYPE_UUID";

/// OpenMRS core "Test Order" order type.
pub const DEFAULT_LAB_ORDER_TYPE_UUID: &str = "52a447d3-a64a-11e3-9aeb-50e549534c5e";

/// Path the front end sends users to when the EMR rejects their credentials.
pub const LOGIN_PATH: &str = "/login";

/// Name of the OpenMRS session cookie.
pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

pub const USER_AGENT: &str = concat!("clinic-core/", env!("CARGO_PKG_VERSION"));

/// Default number of rows per page in list views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: usize = 200;

/// Minimum number of characters before a patient search is sent to the EMR.
pub const MIN_PATIENT_QUERY_LEN: usize = 2;

/// Default number of patients returned by a search.
pub const DEFAULT_PATIENT_SEARCH_LIMIT: usize = 50;

/// Stock operation type used when submitting reconciliation variances.
pub const ADJUSTMENT_OPERATION_TYPE: &str = "adjustment";

/// Datetime layout OpenMRS expects for `obsDatetime` and similar fields.
pub const OPENMRS_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
