//! Session/step entities, their state machine, and the session store.

mod model;
mod state;
mod store;

pub use model::{
    CodeChange, WorkflowContext, WorkflowResult, WorkflowSession, WorkflowStep, WorkflowType,
};
pub use state::{Status, TransitionError};
pub use store::{RetentionPolicy, SessionStore};
