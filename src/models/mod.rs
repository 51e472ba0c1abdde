pub mod frame;
pub mod question;

pub use frame::{CapturedFrame, ExtractedText};
pub use question::{
    Difficulty, GenerationParameters, GenerationRequest, GenerationResponse, GenerationResult,
    HandoffPayload, Question, QuestionType,
};
