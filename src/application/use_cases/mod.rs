pub mod dispatcher;
pub mod query_normalizer;
pub mod query_tracker;
pub mod result_classifier;
pub mod session;
