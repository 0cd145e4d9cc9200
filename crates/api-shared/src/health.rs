use crate::dto::HealthRes;

/// Liveness reporting shared by the REST server and the CLI.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static health check; the process answering is the whole signal.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "healthy".into(),
            message: "Multicare is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_reports_healthy() {
        let res = HealthService::check_health();
        assert_eq!(res.status, "healthy");
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
