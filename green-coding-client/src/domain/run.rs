use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::timestamp;

const BRANCH_IDX: usize = 1;
const LAST_RUN_IDX: usize = 4;

/// A branch/run descriptor from `GET runs?repo&sort_by=date`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct RunDescriptor {
    pub branch: String,
    pub last_run: OffsetDateTime,
    fields: Vec<Value>,
}

impl RunDescriptor {
    pub fn from_fields(fields: Vec<Value>) -> Result<Self, String> {
        let branch = fields
            .get(BRANCH_IDX)
            .and_then(Value::as_str)
            .ok_or_else(|| "run descriptor is missing a branch name".to_string())?
            .to_string();

        let last_run = fields
            .get(LAST_RUN_IDX)
            .and_then(Value::as_str)
            .and_then(timestamp::parse)
            .ok_or_else(|| format!("run descriptor for branch '{branch}' has no valid date"))?;

        Ok(Self {
            branch,
            last_run,
            fields,
        })
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

impl TryFrom<Vec<Value>> for RunDescriptor {
    type Error = String;

    fn try_from(fields: Vec<Value>) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn decodes_branch_and_date() {
        let run: RunDescriptor = serde_json::from_value(json!([
            "Green-Software-Foundation/if",
            "main",
            66389738,
            "github",
            "2024-07-24T12:50:35.522413+00:00"
        ]))
        .unwrap();

        assert_eq!(run.branch, "main");
        assert_eq!(run.last_run, datetime!(2024-07-24 12:50:35.522413 UTC));
    }

    #[test]
    fn missing_date_is_an_error() {
        let err = RunDescriptor::from_fields(vec![json!("org/repo"), json!("dev")]).unwrap_err();
        assert!(err.contains("'dev'"));
    }
}
