//! `${VAR}` / `${VAR:-default}` expansion for string settings.

use crate::ConfigError;

/// Expand braced environment references in `value`.
///
/// Strings without `${` are returned as-is, so bare `$` (common in
/// command arguments and URLs) is never touched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| -> Result<Option<String>, UnsetVar> {
        std::env::var(name).map(Some).map_err(|_| UnsetVar(name.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional field in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(v) = value.as_deref() {
        *value = Some(expand_env(v, field)?);
    }
    Ok(())
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MDOCX_TEST_KROKI_HOST", "kroki.internal");
        }
        let result = expand_env("https://${MDOCX_TEST_KROKI_HOST}", "diagrams.kroki_url").unwrap();
        assert_eq!(result, "https://kroki.internal");
        unsafe {
            std::env::remove_var("MDOCX_TEST_KROKI_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDOCX_TEST_UNSET_AUTHOR");
        }
        let result = expand_env("${MDOCX_TEST_UNSET_AUTHOR:-Docs Team}", "author").unwrap();
        assert_eq!(result, "Docs Team");
    }

    #[test]
    fn test_expand_unset_var_errors() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDOCX_TEST_MISSING");
        }
        let err = expand_env("${MDOCX_TEST_MISSING}", "diagrams.command").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MDOCX_TEST_MISSING"));
        assert!(err.to_string().contains("diagrams.command"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        let result = expand_env("-o $OUT", "diagrams.args").unwrap();
        assert_eq!(result, "-o $OUT");
    }

    #[test]
    fn test_expand_opt_none() {
        let mut value = None;
        expand_opt(&mut value, "title").unwrap();
        assert_eq!(value, None);
    }
}
