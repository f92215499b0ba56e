use green_coding_client::MeasurementRow;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::pipeline::PluginError;
use crate::validation::{EcoCiConfig, ObservationInput};

/// Joules to kWh.
pub const KWH_PER_JOULE: f64 = 2.78e-8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregatedMetrics {
    /// kWh.
    pub energy: f64,
    /// gCO2eq.
    pub carbon: f64,
}

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Window {
    /// The window an input is measured over: configured dates where given,
    /// otherwise the input's own timestamp plus its duration.
    pub fn for_input(config: &EcoCiConfig, input: &ObservationInput, index: usize) -> Result<Self, PluginError> {
        let start = config.start_date.unwrap_or(input.timestamp);

        let end = match config.end_date {
            Some(end) => end,
            None => Duration::checked_seconds_f64(input.duration)
                .and_then(|d| start.checked_add(d))
                .ok_or_else(|| PluginError::InputValidation {
                    index,
                    message: format!("\"duration\" of {} seconds is out of range.", input.duration),
                })?,
        };

        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Sum energy and carbon over the rows that fall inside `window`.
///
/// Energy is summed in mJ and converted to kWh once at the end; carbon is
/// summed as-is in gCO2eq.
pub fn aggregate(rows: &[MeasurementRow], window: &Window) -> AggregatedMetrics {
    let mut energy_mj = 0.0;
    let mut carbon = 0.0;
    let mut matched: u64 = 0;

    for row in rows.iter().filter(|r| window.contains(r.created_at)) {
        energy_mj += row.energy_mj;
        carbon += row.carbon_g;
        matched += 1;
    }

    metrics::counter!("eco_ci_rows_matched_total").increment(matched);

    AggregatedMetrics {
        energy: (energy_mj / 1000.0) * KWH_PER_JOULE,
        carbon,
    }
}
