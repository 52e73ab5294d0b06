//! # Easel - Evaluation harness for agent workflows
//!
//! Easel drives single nodes of an externally owned agent workflow and checks
//! what comes back:
//! - Exact-match routing assertions against reference outputs
//! - LLM-as-judge quality scoring with schema-validated verdicts
//! - A run sharing endpoint with bounded fixed-delay retries
//! - A feedback API client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use easel_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EaselConfig::load()?;
//!     let engine = HttpNodeEngine::new(
//!         config.eval.engine_url.clone().unwrap_or_default(),
//!         config.eval.request_timeout,
//!     )?;
//!     let judge = QualityJudge::new(LLMProviderFactory::create(&config.judge)?);
//!     let runner = EvalCaseRunner::new(Arc::new(engine), &config.eval).with_judge(judge);
//!
//!     let dataset = Dataset::load("cases/generation.yaml")?;
//!     let records = runner.run_all(&dataset.cases, EvalMode::Generation).await?;
//!     println!("{:?}", EvalReport::from_records(&records));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `llm-openai` (default): OpenAI-compatible judge provider

pub mod config;
pub mod error;
pub mod eval;
pub mod feedback;
pub mod llm;
pub mod retry;
pub mod share;

pub use error::{EaselError, ErrorKind, Result};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        EaselConfig, EvalConfig, FeedbackConfig, JudgeConfig, LLMProvider as LLMProviderType,
        ShareConfig,
    };
    pub use crate::error::{EaselError, ErrorKind, Result};
    pub use crate::eval::{
        Dataset, EngineError, EvalCase, EvalCaseRunner, EvalMode, EvalRecord, EvalReport,
        HttpNodeEngine, JudgeSchema, NodeEngine, NodeInvoker, NodeResult, Outcome, Payload,
        QualityJudge, QualityVerdict, RunConfig, StubNodeEngine, StubNodeResponse,
        assert_routed,
    };
    pub use crate::feedback::{Feedback, FeedbackClient, FeedbackResponse};
    pub use crate::llm::{
        LLMProvider, LLMProviderFactory, LLMRequest, LLMResponse, Message, MessageRole,
        StructuredOutput, StubLLMProvider, StubReply,
    };
    pub use crate::retry::{RetryConfig, RetryState, with_retry};
    pub use crate::share::{LinkRunSharer, RunSharer, ShareRequest, ShareResponse, ShareService};
}
