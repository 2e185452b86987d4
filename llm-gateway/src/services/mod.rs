pub mod backends;
pub mod metrics;

pub use backends::{BackendError, BackendPrediction, InferenceBackend, Instance};
