use std::path::PathBuf;

use crate::error::CommonError;
use tracing::{debug, trace, warn};

fn traverse_up_for_env_file(file_name: &str) -> Option<PathBuf> {
    let relative_workspace_root = PathBuf::from("./../../").join(file_name);

    if PathBuf::from(file_name).exists() {
        trace!("Loading environment variables from: {file_name}");
        Some(PathBuf::from(file_name))
    } else if relative_workspace_root.exists() {
        trace!(
            "Loading environment variables from: {}",
            relative_workspace_root.display()
        );
        Some(relative_workspace_root)
    } else {
        trace!(
            "No environment variables file found with name: {:?} in current directory or workspace root",
            file_name
        );
        None
    }
}

fn load_optional_env_file(path: Option<PathBuf>) {
    let Some(path) = path else {
        return;
    };

    match dotenv::from_filename(&path) {
        Ok(_) => debug!("Loaded environment variables from: {}", path.display()),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to load environment file"),
    }
}

/// Load `.env` and `.env.secrets` from the current directory or the
/// workspace root, if present. Variables already set in the process win.
pub fn load_optional_env_files() {
    load_optional_env_file(traverse_up_for_env_file(".env"));
    load_optional_env_file(traverse_up_for_env_file(".env.secrets"));
}

/// Read a variable that must be present and non-empty.
pub fn required_var(key: &str) -> Result<String, CommonError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(CommonError::InvalidRequest {
            msg: format!("environment variable {key} is empty"),
            source: None,
        }),
        Err(e) => Err(CommonError::InvalidRequest {
            msg: format!("environment variable {key} is not set"),
            source: Some(e.into()),
        }),
    }
}

/// Read a variable, treating unset and empty the same way.
pub fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Read an optional variable and parse it.
pub fn parsed_var<T>(key: &str) -> Result<Option<T>, CommonError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| CommonError::InvalidRequest {
                msg: format!("environment variable {key} has an invalid value {raw:?}: {e}"),
                source: None,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    mod unit {
        use super::super::*;

        #[test]
        fn test_required_var_missing() {
            let err = required_var("SHARED_ENV_TEST_DEFINITELY_MISSING").unwrap_err();
            assert!(matches!(err, CommonError::InvalidRequest { .. }));
        }

        #[test]
        fn test_optional_and_parsed_var() {
            unsafe {
                std::env::set_var("SHARED_ENV_TEST_NUMBER", "42");
                std::env::set_var("SHARED_ENV_TEST_BLANK", "  ");
            }

            assert_eq!(optional_var("SHARED_ENV_TEST_BLANK"), None);
            assert_eq!(
                parsed_var::<u64>("SHARED_ENV_TEST_NUMBER").unwrap(),
                Some(42)
            );
            assert_eq!(parsed_var::<u64>("SHARED_ENV_TEST_UNSET").unwrap(), None);
        }

        #[test]
        fn test_parsed_var_invalid() {
            unsafe {
                std::env::set_var("SHARED_ENV_TEST_NOT_A_NUMBER", "abc");
            }
            assert!(parsed_var::<u64>("SHARED_ENV_TEST_NOT_A_NUMBER").is_err());
        }
    }
}
