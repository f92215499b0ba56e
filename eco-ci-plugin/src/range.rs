use green_coding_client::MeasurementQuery;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::pipeline::PluginError;
use crate::validation::{EcoCiConfig, ObservationInput};

/// The window used to query the measurement API.
///
/// `start`/`end` keep the full instants; `start_date`/`end_date` are the
/// day-granularity values actually sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub start_date: Date,
    pub end_date: Date,
}

/// Resolve the query range using the host's local UTC offset for widened
/// end dates. Falls back to UTC when the offset cannot be determined.
pub fn resolve(config: &EcoCiConfig, inputs: &[ObservationInput]) -> Result<ResolvedRange, PluginError> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    resolve_with_offset(config, inputs, offset)
}

/// Resolve the query range.
///
/// - start: `start-date`, else the first input's timestamp.
/// - end: `start-date` when only it is set, else `end-date`, else the last
///   input's timestamp.
/// - when start and end fall on the same day the end is widened by the last
///   input's duration and its date is taken in `offset`.
pub fn resolve_with_offset(
    config: &EcoCiConfig,
    inputs: &[ObservationInput],
    offset: UtcOffset,
) -> Result<ResolvedRange, PluginError> {
    let missing_timestamp = || PluginError::InputValidation {
        index: 0,
        message: "\"timestamp\" parameter is required. Error code: invalid_type.".to_string(),
    };

    let start = match (config.start_date, inputs.first()) {
        (Some(start), _) => start,
        (None, Some(first)) => first.timestamp,
        (None, None) => return Err(missing_timestamp()),
    };

    let end = match (config.start_date, config.end_date, inputs.last()) {
        (Some(start), None, _) => start,
        (_, Some(end), _) => end,
        (None, None, Some(last)) => last.timestamp,
        (None, None, None) => return Err(missing_timestamp()),
    };

    let duration = inputs.last().map_or(0.0, |last| last.duration);

    let start_date = start.date();
    let end_date = end.date();

    if start_date != end_date {
        return Ok(ResolvedRange {
            start,
            end,
            start_date,
            end_date,
        });
    }

    let last_index = inputs.len().saturating_sub(1);
    let widened = Duration::checked_seconds_f64(duration)
        .and_then(|d| end.checked_add(d))
        .ok_or_else(|| PluginError::InputValidation {
            index: last_index,
            message: format!("\"duration\" of {duration} seconds is out of range."),
        })?;

    let end_date = widened
        .checked_add(Duration::seconds(i64::from(offset.whole_seconds())))
        .map_or(widened.date(), |local| local.date());

    tracing::debug!(
        %start_date,
        %end_date,
        duration,
        "widened same-day range by the last input's duration"
    );

    Ok(ResolvedRange {
        start,
        end: widened,
        start_date,
        end_date,
    })
}

/// Build the measurement query for a resolved range.
pub fn query_for(config: &EcoCiConfig, range: &ResolvedRange) -> MeasurementQuery {
    MeasurementQuery {
        repo: config.repo.clone(),
        branch: config.branch.clone(),
        workflow: config.workflow,
        start_date: range.start_date,
        end_date: range.end_date,
    }
}
