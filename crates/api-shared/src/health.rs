use crate::dto::HealthRes;

/// Health check served by the REST API.
pub struct HealthService;

impl HealthService {
    /// Liveness report.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic is alive".into(),
        }
    }
}
