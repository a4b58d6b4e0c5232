//! Conversation engine for the intake bot
//!
//! Features:
//! - Fixed dialogue graph (name → category → sub-type → details → contact)
//! - Input aggregation across text, photo and document messages
//! - Phone validation with an unlimited retry loop
//! - Lead finalization (table row + operator notification)
//! - Operator desk (lead details, spreadsheet link)
//! - Per-user serialized dispatch

pub mod aggregator;
pub mod capabilities;
pub mod dialogue;
pub mod dispatcher;
pub mod engine_config;
pub mod finalizer;
pub mod locale;
pub mod metrics;
pub mod operator;
pub mod prompts;

pub use aggregator::{Aggregation, InputAggregator};
pub use capabilities::Capabilities;
pub use dialogue::{DialogueEngine, Outcome};
pub use dispatcher::Dispatcher;
pub use engine_config::EngineConfig;
pub use finalizer::{build_record, FinalizeError, LeadFinalizer};
pub use locale::{resolve_locale, ResolvedLocale};
pub use self::metrics::describe_metrics;
pub use operator::OperatorDesk;
pub use prompts::{Prompt, PromptRenderer};

use intake_bot_core::{CapabilityError, CoreError};
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),
}
