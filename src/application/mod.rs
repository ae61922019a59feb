pub mod use_cases;

pub use use_cases::session::AnalysisSession;
