//! Locating the config file and the archive directory.

use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

/// `$HOME`, falling back to `/home/$USER`.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| {
        let user = env::var("USER").unwrap_or_else(|_| "nufeed".to_string());
        PathBuf::from("/home").join(user)
    })
}

fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(fallback))
}

/// `$XDG_CONFIG_HOME`, defaulting to `~/.config`.
pub fn xdg_config_home() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// `$XDG_DATA_HOME`, defaulting to `~/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

fn variable(name: &str, input: &str) -> PathResult<String> {
    let known = match name {
        "HOME" => Some(home_dir()),
        "XDG_CONFIG_HOME" => Some(xdg_config_home()),
        "XDG_DATA_HOME" => Some(xdg_data_home()),
        _ => None,
    };
    if let Some(dir) = known {
        return Ok(dir.to_string_lossy().into_owned());
    }

    env::var(name).map_err(|_| {
        PathError::MissingEnvVar {
            var: name.to_string(),
            input: input.to_string(),
        }
    })
}

/// Expands a leading `~` and every `$VAR` / `${VAR}`. A `$` not followed by a name is kept.
fn expand(input: &str) -> PathResult<String> {
    let (mut expanded, mut rest) = match input.strip_prefix('~') {
        Some(rest) => (home_dir().to_string_lossy().into_owned(), rest),
        None => (String::new(), input),
    };

    while let Some(dollar) = rest.find('$') {
        expanded.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            let close = braced.find('}').ok_or_else(|| {
                PathError::UnclosedVariable {
                    input: format!("${{{braced}"),
                }
            })?;
            expanded.push_str(&variable(&braced[..close], input)?);
            rest = &braced[close + 1..];
        } else {
            let len = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                expanded.push('$');
            } else {
                expanded.push_str(&variable(&after[..len], input)?);
            }
            rest = &after[len..];
        }
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Resolves a configured path: expands `~` and environment variables, then anchors
/// relative results at the current directory.
///
/// # Errors
///
/// * [`PathError::Empty`] for a blank path.
/// * [`PathError::MissingEnvVar`] when a referenced variable is unset.
/// * [`PathError::UnclosedVariable`] for `${` without `}`.
/// * [`PathError::CurrentDir`] when a relative path cannot be anchored.
///
/// ```
/// use nufeed_utils::path::resolve_path;
///
/// let archives = resolve_path("/srv/feed/packages").unwrap();
/// assert!(archives.is_absolute());
/// ```
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = PathBuf::from(expand(path)?);
    if expanded.is_absolute() {
        return Ok(expanded);
    }

    env::current_dir()
        .map(|cwd| cwd.join(expanded))
        .map_err(|source| PathError::CurrentDir { source })
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_expand_plain_and_braced_variables() {
        env::set_var("NUFEED_TEST_VAR", "feed");
        assert_eq!(expand("$NUFEED_TEST_VAR/packages").unwrap(), "feed/packages");
        assert_eq!(expand("${NUFEED_TEST_VAR}_dir").unwrap(), "feed_dir");
        env::remove_var("NUFEED_TEST_VAR");
    }

    #[test]
    #[serial]
    fn test_expand_missing_variable() {
        env::remove_var("NUFEED_SURELY_UNSET");
        assert!(matches!(
            expand("$NUFEED_SURELY_UNSET/path"),
            Err(PathError::MissingEnvVar { .. })
        ));
    }

    #[test]
    fn test_expand_unclosed_and_lone_dollar() {
        assert!(matches!(
            expand("${HOME/path"),
            Err(PathError::UnclosedVariable { .. })
        ));
        assert_eq!(expand("a$/b").unwrap(), "a$/b");
    }

    #[test]
    #[serial]
    fn test_resolve_path_tilde_and_home() {
        env::set_var("HOME", "/home/feeduser");
        assert_eq!(
            resolve_path("~/packages").unwrap(),
            PathBuf::from("/home/feeduser/packages")
        );
        assert_eq!(
            resolve_path("$HOME/packages").unwrap(),
            PathBuf::from("/home/feeduser/packages")
        );
    }

    #[test]
    fn test_resolve_path_blank_and_relative() {
        assert!(matches!(resolve_path("   "), Err(PathError::Empty)));

        let resolved = resolve_path("packages").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("packages"));
    }

    #[test]
    #[serial]
    fn test_xdg_dirs_fallback() {
        env::set_var("HOME", "/home/feeduser");
        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_DATA_HOME");
        assert_eq!(xdg_config_home(), PathBuf::from("/home/feeduser/.config"));
        assert_eq!(
            xdg_data_home(),
            PathBuf::from("/home/feeduser/.local/share")
        );
    }
}
