pub mod budget;
pub mod quiz_ctx;
pub mod quiz_flow;

#[cfg(test)]
pub(crate) mod test_support;

pub use budget::TimeBudget;
pub use quiz_ctx::QuizCtx;
pub use quiz_flow::{FlowSettings, QuizCompletion, QuizFlow};
