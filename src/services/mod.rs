pub mod answer_submitter;
pub mod document_service;
pub mod llm_service;
pub mod page_fetcher;
pub mod rate_limiter;
pub mod task_extractor;

pub use answer_submitter::{AnswerSubmitter, HttpAnswerSubmitter};
pub use document_service::DocumentService;
pub use llm_service::{LlmService, TaskSolver};
pub use page_fetcher::{FetchMode, HttpPageFetcher, PageFetcher, QuizPageFetcher, RenderingPageFetcher};
pub use rate_limiter::RateLimiter;
pub use task_extractor::TaskExtractor;
