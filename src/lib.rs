// Library surface for the session binary, headless tests and reuse.
// Terminal screens stay in the binary (main.rs + ui/).
pub mod app;
pub mod config;
pub mod error;
pub mod plan;
pub mod recorder;
pub mod runtime;
pub mod submit;
pub mod summary;
pub mod template;
pub mod timer;
pub mod walker;

pub use error::{Result, SessionError};
pub use plan::{Activity, Behavior, BehaviorQueue, Cursor, PlanType, ResultKind, SessionContext, SessionHeader, Try};
pub use walker::{SessionWalker, Transition, WalkerState};
