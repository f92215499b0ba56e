use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::timestamp;

const ENERGY_IDX: usize = 0;
const CREATED_AT_IDX: usize = 3;
const LABEL_IDX: usize = 4;

/// One step-level measurement as returned by `GET measurements`.
///
/// The API sends each row as a positional array:
/// `[energy_mj, unit, run_id, created_at, label, cpu, commit_hash, duration,
///   source, cpu_util_avg, workflow_name, lat, lon, city, carbon_intensity_g,
///   carbon_g]`. Only the energy, timestamp and trailing carbon positions are
/// decoded into typed fields; the full array is kept so callers can reach
/// the rest without the shape being lost.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct MeasurementRow {
    pub energy_mj: f64,
    pub created_at: OffsetDateTime,
    pub carbon_g: f64,
    fields: Vec<Value>,
}

impl MeasurementRow {
    /// Decode a positional row. This is the only place that knows the indices.
    pub fn from_fields(fields: Vec<Value>) -> Result<Self, String> {
        // created_at and carbon must be distinct positions.
        if fields.len() <= CREATED_AT_IDX + 1 {
            return Err(format!(
                "measurement row has {} fields, expected at least {}",
                fields.len(),
                CREATED_AT_IDX + 2
            ));
        }

        let energy_mj = number(&fields[ENERGY_IDX])
            .ok_or_else(|| format!("invalid energy value {}", fields[ENERGY_IDX]))?;

        let created_at = fields[CREATED_AT_IDX]
            .as_str()
            .and_then(timestamp::parse)
            .ok_or_else(|| format!("invalid measurement timestamp {}", fields[CREATED_AT_IDX]))?;

        let carbon_field = &fields[fields.len() - 1];
        let carbon_g = match carbon_field {
            // The API leaves carbon empty when no grid intensity was known.
            Value::Null => 0.0,
            Value::String(s) if s.trim().is_empty() => 0.0,
            other => number(other).ok_or_else(|| format!("invalid carbon value {other}"))?,
        };

        Ok(Self {
            energy_mj,
            created_at,
            carbon_g,
            fields,
        })
    }

    /// Step name, e.g. `checkout` or `npm install`.
    pub fn label(&self) -> Option<&str> {
        self.fields.get(LABEL_IDX).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

impl TryFrom<Vec<Value>> for MeasurementRow {
    type Error = String;

    fn try_from(fields: Vec<Value>) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

/// Numbers may arrive either as JSON numbers or as numeric strings.
pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn checkout_row() -> Value {
        json!([
            3123, "mJ", "10074332144", "2024-07-24T09:43:38.428708+00:00",
            "checkout", "EPYC_7763", "72db420085ca7a904bc264ff3bcfb54d6a35b4c8",
            1, "github", 4, "Node.js CI", "", "", "", "419", "0.001593851"
        ])
    }

    #[test]
    fn decodes_positional_row() {
        let row: MeasurementRow = serde_json::from_value(checkout_row()).unwrap();

        assert_eq!(row.energy_mj, 3123.0);
        assert_eq!(row.created_at, datetime!(2024-07-24 09:43:38.428708 UTC));
        assert_eq!(row.carbon_g, 0.001593851);
        assert_eq!(row.label(), Some("checkout"));
        assert_eq!(row.fields().len(), 16);
        assert_eq!(row.fields()[1], json!("mJ"));
        assert_eq!(row.fields()[5], json!("EPYC_7763"));
    }

    #[test]
    fn numeric_carbon_and_string_energy() {
        let row = MeasurementRow::from_fields(vec![
            json!("81767"),
            json!("mJ"),
            json!("1"),
            json!("2024-07-24T09:43:55Z"),
            json!(0.5),
        ])
        .unwrap();

        assert_eq!(row.energy_mj, 81767.0);
        assert_eq!(row.carbon_g, 0.5);
    }

    #[test]
    fn missing_carbon_counts_as_zero() {
        let row = MeasurementRow::from_fields(vec![
            json!(10),
            json!("mJ"),
            json!("1"),
            json!("2024-07-24T09:43:55Z"),
            Value::Null,
        ])
        .unwrap();

        assert_eq!(row.carbon_g, 0.0);
    }

    #[test]
    fn rejects_short_rows() {
        let err = MeasurementRow::from_fields(vec![json!(1), json!("mJ"), json!("1"), json!("2024-07-24")])
            .unwrap_err();
        assert!(err.contains("at least 5"));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let err = MeasurementRow::from_fields(vec![
            json!(1),
            json!("mJ"),
            json!("1"),
            json!("not a date"),
            json!("0.1"),
        ])
        .unwrap_err();
        assert!(err.contains("timestamp"));
    }

    #[test]
    fn rejects_non_numeric_carbon() {
        let err = MeasurementRow::from_fields(vec![
            json!(1),
            json!("mJ"),
            json!("1"),
            json!("2024-07-24T09:43:55Z"),
            json!("lots"),
        ])
        .unwrap_err();
        assert!(err.contains("carbon"));
    }
}
