#![deny(clippy::all)]

pub mod config;
pub mod cons;
pub mod llm;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use config::{load_dotenv, AppConfig, ProviderSettings};
pub use cons::provider_cons::LLMProvider;
pub use llm::models::provider_base::{GenerationOptions, ProviderClient, ProviderInfo};
pub use llm::models::transport::{
    HttpRequest, HttpTransport, ReqwestTransport, ReqwestTransportFactory, TransportFactory,
    UnavailableTransportFactory,
};
pub use llm::orchestrator::{AiPowerhouse, NO_PROVIDERS_KEY, NO_PROVIDERS_MESSAGE};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        use log::LevelFilter;
        use log4rs::append::file::FileAppender;
        use log4rs::config::{Appender, Config, Root};
        use log4rs::encode::pattern::PatternEncoder;

        // Try to load log4rs configuration from file first
        let config_path = std::env::var("LOG4RS_CONFIG").unwrap_or_else(|_| "log4rs.yaml".to_string());
        if log4rs::init_file(&config_path, Default::default()).is_ok() {
            return;
        }

        let pattern = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}";

        let logfile = match FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(pattern)))
            .build("logs/ai-powerhouse.log")
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[INIT] Failed to create log file: {}", e);
                return;
            }
        };

        let config = match Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        {
            Ok(c) => c,
            Err(e) => {
                eprintln!("[INIT] Failed to build config: {}", e);
                return;
            }
        };

        if let Err(e) = log4rs::init_config(config) {
            eprintln!("[INIT] Failed to initialize logger: {}", e);
        }
    });
}
