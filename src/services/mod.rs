pub mod extraction_gateway;
pub mod generation_gateway;

pub use extraction_gateway::{ExtractionGateway, TextExtractor};
pub use generation_gateway::{GenerationGateway, GenerationOutcome, QuestionGenerator};
