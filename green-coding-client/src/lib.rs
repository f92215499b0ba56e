pub mod api;
pub mod domain;
pub mod timestamp;

pub use api::{ApiError, GreenCodingApi, MetricsApi, RemoteMetricsClient};
pub use domain::{MeasurementQuery, MeasurementRow, RunDescriptor};
