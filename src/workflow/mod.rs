pub mod pipeline_state;
pub mod word_count_policy;

pub use pipeline_state::{PipelinePhase, PipelineState, SessionTicket};
pub use word_count_policy::{word_count, QuestionConstraints, WordCountPolicy, PRESET_COUNTS};
