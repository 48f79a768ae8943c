//! Accounts module: owners, passwords and sign-in sessions
//!
//! Every student record belongs to exactly one account. The account's
//! email is the only address the notifier ever mails.

pub mod handler;
pub mod password;
pub mod store;
pub mod types;

pub use handler::{accounts_router, current_owner, AccountsState};
pub use store::AccountStore;
pub use types::{Account, AccountProfile, LoginForm, ProfileForm, RegisterForm};
