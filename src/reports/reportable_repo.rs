use crate::metrics::Dashboard;
use chrono::{DateTime, Utc};

/// A repository's charts, ready for reporting.
#[derive(Debug, Clone)]
pub struct ReportableRepo {
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub dashboard: Dashboard,
}

impl ReportableRepo {
    #[must_use]
    #[expect(clippy::missing_const_for_fn, reason = "Cannot be const due to non-const parameter types")]
    pub fn new(repository: String, generated_at: DateTime<Utc>, dashboard: Dashboard) -> Self {
        Self {
            repository,
            generated_at,
            dashboard,
        }
    }
}
