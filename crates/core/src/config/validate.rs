use super::{
    types::{Config, MAX_SUMMARY_LIMIT},
    AuthMethod, ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Storage url, username and offline dir are set
/// - Search url is set
/// - Auth method has the settings it needs
/// - Batch summary limit is between 1 and 10
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.storage.url.trim().is_empty() {
        return Err(invalid("storage.url must be set"));
    }
    if config.storage.username.trim().is_empty() {
        return Err(invalid("storage.username must be set"));
    }
    if config.storage.offline_dir.trim().is_empty() {
        return Err(invalid("storage.offline_dir must be set"));
    }

    if config.search.url.trim().is_empty() {
        return Err(invalid("search.url must be set"));
    }

    match config.auth.method {
        AuthMethod::None => {}
        AuthMethod::AllowList => {
            if config.auth.allowed_user_ids.is_empty() {
                return Err(invalid(
                    "auth.allowed_user_ids cannot be empty when method = \"allow_list\"",
                ));
            }
        }
    }

    if config.batch.summary_limit == 0 {
        return Err(invalid("batch.summary_limit cannot be 0"));
    }
    if config.batch.summary_limit > MAX_SUMMARY_LIMIT {
        return Err(ConfigError::ValidationError(format!(
            "batch.summary_limit cannot exceed {}",
            MAX_SUMMARY_LIMIT
        )));
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}
