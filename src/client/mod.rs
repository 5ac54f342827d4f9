pub mod context;
pub mod http;
pub mod identity;

pub use context::AppContext;
pub use http::{HabitClient, HttpScoring};
pub use identity::{IdentityStore, StoredIdentity};
