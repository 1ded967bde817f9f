pub mod cache;
pub mod dataset;
pub mod validator;

pub use cache::EvaluationCache;
pub use dataset::SearchData;
pub use validator::DataValidator;
