//! Admin identity and sessions: allowlist resolution, password checks,
//! signed session cookies, the session gate, and the recovery flow.

pub mod allowlist;
pub mod credentials;
pub mod login;
pub mod middleware;
pub mod recover;
pub mod session;
pub mod state;
pub mod tokens;
pub mod types;
mod utils;
pub mod verify;

pub use allowlist::AllowlistConfig;
pub use state::{AuthConfig, AuthState};
