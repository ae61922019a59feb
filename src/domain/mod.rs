pub mod agent_config;
pub mod error;
pub mod outcome;
pub mod table;
