use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Liveness report served on `/health`.
///
/// Reports liveness of this process only; it does not call the EMR.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic API is alive".into(),
        }
    }
}
