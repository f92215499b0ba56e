pub mod green_coding;
pub mod remote;

pub use green_coding::GreenCodingApi;
pub use remote::RemoteMetricsClient;

use crate::domain::{MeasurementQuery, MeasurementRow, RunDescriptor};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("No response received from Green Coding API. {0}")]
    Transport(String),
    #[error("Error fetching data from Green Coding API ({status}). {message}")]
    Server { status: u16, message: String },
    /// The envelope came back with `success: false`.
    #[error("Error fetching data from Green Coding API. {0}")]
    Unsuccessful(String),
    #[error("Malformed response from Green Coding API. {0}")]
    Malformed(String),
}

/// The two read operations the plugin needs from the measurement service.
#[async_trait::async_trait]
pub trait MetricsApi: Send + Sync {
    async fn measurements(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementRow>, ApiError>;

    /// Runs for `repo`, most recent first.
    async fn runs(&self, repo: &str) -> Result<Vec<RunDescriptor>, ApiError>;
}

#[async_trait::async_trait]
impl<T: MetricsApi + ?Sized> MetricsApi for std::sync::Arc<T> {
    async fn measurements(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementRow>, ApiError> {
        (**self).measurements(query).await
    }

    async fn runs(&self, repo: &str) -> Result<Vec<RunDescriptor>, ApiError> {
        (**self).runs(repo).await
    }
}
