

#[cfg(test)]
pub mod llm {
    pub mod models {
        pub mod gemini;
        pub mod claude;
        pub mod openai;
        pub mod provider_handle;
    }
    pub mod orchestrator;
}
