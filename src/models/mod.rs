pub mod quiz;

pub use quiz::{is_demo_url, ExtractedTask, QuizRequest, SubmissionResult, SubmitPayload};
