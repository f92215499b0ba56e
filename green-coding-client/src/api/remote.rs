use std::collections::HashSet;

use super::{ApiError, MetricsApi};
use crate::domain::{MeasurementQuery, MeasurementRow};

/// Fetches measurement rows for a query, expanding `branch: all` into one
/// request per branch that ran inside the query window.
///
/// Requests are issued one at a time so that the first failing branch is the
/// one reported.
#[derive(Debug, Clone)]
pub struct RemoteMetricsClient<A> {
    api: A,
}

impl<A: MetricsApi> RemoteMetricsClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn fetch(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementRow>, ApiError> {
        if query.is_all_branches() {
            self.fetch_all_branches(query).await
        } else {
            self.api.measurements(query).await
        }
    }

    async fn fetch_all_branches(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementRow>, ApiError> {
        let runs = self.api.runs(&query.repo).await?;

        // The window covers start_date 00:00 through the whole of end_date.
        let start = query.start_date.midnight().assume_utc();
        let end = query
            .end_date
            .next_day()
            .map(|d| d.midnight().assume_utc())
            .unwrap_or_else(|| query.end_date.with_hms(23, 59, 59).map_or(start, |t| t.assume_utc()));

        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for run in &runs {
            if run.last_run < start || run.last_run >= end {
                continue;
            }
            if !seen.insert(run.branch.as_str()) {
                continue;
            }

            tracing::debug!(branch = %run.branch, "fetching measurements for branch");
            let branch_rows = self.api.measurements(&query.for_branch(&run.branch)).await?;
            rows.extend(branch_rows);
        }

        tracing::debug!(
            branches = seen.len(),
            rows = rows.len(),
            "collected measurements across branches"
        );

        Ok(rows)
    }
}
