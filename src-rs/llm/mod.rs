pub mod models;
pub mod orchestrator;

pub use orchestrator::AiPowerhouse;
