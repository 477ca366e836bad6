pub mod registration_ctx;
pub mod registration_orchestrator;
pub mod retry_policy;

pub use registration_ctx::RegistrationCtx;
pub use registration_orchestrator::{
    RegistrationOrchestrator, RegistrationOutcome, RegistrationSettings,
};
pub use retry_policy::{next_step, NextStep};
