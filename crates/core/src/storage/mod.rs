//! Remote storage service: raw API, credential cache and sessions.

mod alist;
mod credential;
mod session;
mod types;

pub use alist::AlistClient;
pub use credential::{Credential, CredentialCache, CredentialError, CREDENTIAL_VALIDITY_HOURS};
pub use session::{Session, SessionError};
pub use types::*;
