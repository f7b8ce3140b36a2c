mod bucket;
mod error_handler;
mod rate_limit;

pub use bucket::ClientBucket;
pub use error_handler::log_errors;
pub use rate_limit::{Admission, AdmissionGate, EndpointClass, EndpointClassifier, client_key, rate_limit};
