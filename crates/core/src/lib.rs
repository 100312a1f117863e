pub mod auth;
pub mod batch;
pub mod catalog_code;
pub mod cleanup;
pub mod config;
pub mod maintenance;
pub mod metrics;
pub mod search;
pub mod storage;
pub mod testing;
pub mod tree;

pub use auth::{
    create_authenticator, AllowListAuthenticator, AuthError, AuthRequest, Authenticator,
    Identity, NoneAuthenticator,
};
pub use batch::{
    BatchCoordinator, BatchItem, BatchProgress, BatchReport, BatchSummary, ItemStatus,
    ProgressCallback, RefreshOutcome, Submitter,
};
pub use catalog_code::{classify_input, classify_lines, normalize_code, InputKind};
pub use cleanup::{
    CleanupPlan, CleanupReport, CleanupRules, CleanupService, CodeCleanupReport, FailureDetail,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use maintenance::{MaintenanceScheduler, MaintenanceStatus};
pub use search::{
    resolve_code, CandidateEntry, HttpSearcher, MagnetSearcher, SearchError, Selection,
};
pub use storage::{
    AlistClient, Credential, CredentialCache, CredentialError, RemoteEntry, Session,
    SessionError, StorageApi, StorageError,
};
pub use tree::{RemoteNode, RemoteTree, SubtreeFailure, TreeSnapshot};
