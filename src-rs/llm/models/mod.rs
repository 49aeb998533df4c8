// Provider contract, backend adapters and the transport seam they call through

pub mod provider_handle;
pub mod provider_base;
pub mod transport;
pub mod claude;

pub mod gemini;
pub mod openai;
