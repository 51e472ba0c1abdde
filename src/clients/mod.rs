pub mod llm_client;
pub mod ocr_client;

pub use llm_client::LlmClient;
pub use ocr_client::HttpOcrClient;
