pub mod measurement;
pub mod query;
pub mod run;

pub use measurement::MeasurementRow;
pub use query::MeasurementQuery;
pub use run::RunDescriptor;
