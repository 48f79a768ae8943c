//! Students module: owner-scoped records with PDF summaries by mail

pub mod handler;
pub mod store;
pub mod types;
pub mod workflow;

pub use handler::{students_router, StudentsState};
pub use store::StudentStore;
pub use types::{Student, StudentFields, StudentForm};
pub use workflow::{CreateOutcome, StudentWorkflow};
