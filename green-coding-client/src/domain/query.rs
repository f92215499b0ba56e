use time::Date;

use crate::timestamp::format_date;

/// Parameters for a single `GET measurements` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementQuery {
    pub repo: String,
    pub branch: String,
    pub workflow: u64,
    pub start_date: Date,
    pub end_date: Date,
}

impl MeasurementQuery {
    /// `branch: all` selects the multi-branch fetch path.
    pub fn is_all_branches(&self) -> bool {
        self.branch.trim().eq_ignore_ascii_case("all")
    }

    pub fn for_branch(&self, branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            ..self.clone()
        }
    }

    /// Query-string pairs, snake-cased and with day-granularity dates.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("repo", self.repo.clone()),
            ("branch", self.branch.clone()),
            ("workflow", self.workflow.to_string()),
            ("start_date", format_date(self.start_date)),
            ("end_date", format_date(self.end_date)),
        ]
    }
}
