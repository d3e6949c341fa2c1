//! Remote path templates.
//!
//! A [`PathCodec`] owns one template such as `auth/{backend}/config/identity`
//! and the anchored regex that inverts it, so building a path and extracting
//! the backend name back out of a stored id can never drift apart.

use regex::Regex;
use thiserror::Error;

/// A stored path that does not fit its template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no backend found")]
    NoMatch,

    /// Capture count differs from the template's parameter count.
    #[error("unexpected number of matches ({0}) for backend")]
    UnexpectedMatchCount(usize),
}

/// Bidirectional mapping between parameters and a remote path.
#[derive(Debug, Clone)]
pub struct PathCodec {
    template: &'static str,
    params: Vec<&'static str>,
    regex: Regex,
}

impl PathCodec {
    /// Compile a template. Parameters are written `{name}` and match one or
    /// more characters, including `/`.
    pub fn new(template: &'static str) -> Result<Self, regex::Error> {
        let mut params = Vec::new();
        let mut pattern = String::from("^");
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            pattern.push_str(&regex::escape(&rest[..start]));
            pattern.push_str(&format!("(?P<{name}>.+?)"));
            params.push(name);
            rest = &rest[start + len + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        Ok(Self {
            template,
            params,
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Path for a single-parameter template. Leading and trailing slashes
    /// are trimmed from the value.
    pub fn path_for(&self, backend: &str) -> String {
        self.path_for_params(&[backend])
    }

    /// Path with parameters substituted in template order.
    pub fn path_for_params(&self, values: &[&str]) -> String {
        let mut path = self.template.to_string();
        for (name, value) in self.params.iter().zip(values) {
            path = path.replacen(&format!("{{{name}}}"), value.trim_matches('/'), 1);
        }
        path
    }

    /// Extract the first parameter (the backend) from a path.
    pub fn backend_from_path(&self, path: &str) -> Result<String, PathError> {
        let mut params = self.params_from_path(path)?;
        Ok(params.swap_remove(0))
    }

    /// Extract every parameter from a path, in template order.
    pub fn params_from_path(&self, path: &str) -> Result<Vec<String>, PathError> {
        let caps = self.regex.captures(path).ok_or(PathError::NoMatch)?;
        if caps.len() != self.params.len() + 1 || self.params.is_empty() {
            return Err(PathError::UnexpectedMatchCount(caps.len()));
        }
        Ok(self
            .params
            .iter()
            .map(|name| caps.name(name).map_or_else(String::new, |m| m.as_str().to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PathCodec {
        PathCodec::new("auth/{backend}/config/identity").unwrap()
    }

    #[test]
    fn test_path_for_trims_slashes() {
        let codec = identity();
        assert_eq!(codec.path_for("aws"), "auth/aws/config/identity");
        assert_eq!(codec.path_for("/aws/"), "auth/aws/config/identity");
        assert_eq!(codec.path_for("team/aws"), "auth/team/aws/config/identity");
    }

    #[test]
    fn test_round_trip() {
        let codec = identity();
        for backend in ["aws", "/aws", "aws/", "my-aws", "nested/aws", "a.b_c"] {
            let path = codec.path_for(backend);
            assert_eq!(
                codec.backend_from_path(&path).unwrap(),
                backend.trim_matches('/')
            );
        }
    }

    #[test]
    fn test_no_match() {
        let codec = identity();
        for path in [
            "auth/aws/config",
            "auth//config/identity",
            "sys/auth/aws/config/identity",
            "auth/aws/config/identity/extra",
            "",
        ] {
            assert_eq!(codec.backend_from_path(path), Err(PathError::NoMatch), "{path}");
        }
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let codec = PathCodec::new("auth/{backend}/config.identity").unwrap();
        assert!(codec.backend_from_path("auth/aws/configXidentity").is_err());
        assert_eq!(codec.backend_from_path("auth/aws/config.identity").unwrap(), "aws");
    }

    #[test]
    fn test_multiple_params() {
        let codec = PathCodec::new("auth/{backend}/map/teams/{team}").unwrap();
        let path = codec.path_for_params(&["/github/", "dev"]);
        assert_eq!(path, "auth/github/map/teams/dev");
        assert_eq!(
            codec.params_from_path(&path).unwrap(),
            vec!["github".to_string(), "dev".to_string()]
        );
        assert_eq!(codec.backend_from_path(&path).unwrap(), "github");
    }

    #[test]
    fn test_template_without_params() {
        let codec = PathCodec::new("sys/auth").unwrap();
        assert_eq!(
            codec.backend_from_path("sys/auth"),
            Err(PathError::UnexpectedMatchCount(1))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(PathError::NoMatch.to_string(), "no backend found");
        assert_eq!(
            PathError::UnexpectedMatchCount(3).to_string(),
            "unexpected number of matches (3) for backend"
        );
    }
}
