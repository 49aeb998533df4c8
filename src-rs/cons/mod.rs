pub mod provider_cons;

pub use provider_cons::LLMProvider;
