//! Backend targets.
//!
//! # Responsibilities
//! - Parse and validate backend base URLs at startup
//! - Hold the immutable, non-empty set of targets
//! - Build outbound URLs from a target and an inbound path
//!
//! # Design Decisions
//! - Only `http` and `https` schemes are accepted
//! - An empty set is an error, so selection never has to handle "no target"
//! - Targets are never mutated after loading

use std::fmt;
use std::ops::Deref;

use thiserror::Error;
use url::Url;

/// Errors raised while loading targets.
#[derive(Error, Debug)]
pub enum TargetError {
    /// No targets were configured.
    #[error("no targets configured")]
    Empty,

    /// A target string could not be parsed as an absolute URL.
    #[error("invalid target URL {input:?}: {source}")]
    Parse {
        input: String,
        source: url::ParseError,
    },

    /// A target uses a scheme other than http or https.
    #[error("invalid target URL scheme: {scheme} (in {input:?})")]
    Scheme { input: String, scheme: String },

    /// A target URL has no host.
    #[error("target URL {input:?} has no host")]
    MissingHost { input: String },
}

/// A single backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base_url: Url,
}

impl Target {
    /// Parse a target from a URL string.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let base_url = Url::parse(input.trim()).map_err(|source| TargetError::Parse {
            input: input.to_string(),
            source,
        })?;

        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TargetError::Scheme {
                    input: input.to_string(),
                    scheme: other.to_string(),
                })
            }
        }

        if base_url.host_str().map_or(true, str::is_empty) {
            return Err(TargetError::MissingHost {
                input: input.to_string(),
            });
        }

        Ok(Self { base_url })
    }

    /// The base URL of this target.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append an inbound path and query to the base URL.
    ///
    /// The base URL's own path (if any) is kept as a prefix.
    pub fn join(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path_and_query.starts_with('/') {
            Url::parse(&format!("{}{}", base, path_and_query))
        } else {
            Url::parse(&format!("{}/{}", base, path_and_query))
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Ordered, non-empty, immutable list of targets.
#[derive(Debug, Clone)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    /// Parse every entry, failing on the first invalid one.
    pub fn parse<I, S>(inputs: I) -> Result<Self, TargetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = inputs
            .into_iter()
            .map(|s| Target::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Err(TargetError::Empty);
        }

        Ok(Self { targets })
    }
}

impl Deref for TargetSet {
    type Target = [Target];

    fn deref(&self) -> &Self::Target {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        let target = Target::parse("https://host:8443").unwrap();
        assert_eq!(target.base_url().scheme(), "https");
        assert_eq!(target.base_url().port(), Some(8443));

        let target = Target::parse("http://localhost").unwrap();
        assert_eq!(target.base_url().scheme(), "http");
    }

    #[test]
    fn rejects_other_schemes() {
        match Target::parse("ftp://host") {
            Err(TargetError::Scheme { scheme, .. }) => assert_eq!(scheme, "ftp"),
            other => panic!("expected scheme error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unparsable() {
        assert!(matches!(
            Target::parse("not a url"),
            Err(TargetError::Parse { .. })
        ));
        assert!(matches!(
            Target::parse("/relative/path"),
            Err(TargetError::Parse { .. })
        ));
    }

    #[test]
    fn empty_set_is_an_error() {
        let none: Vec<String> = Vec::new();
        assert!(matches!(TargetSet::parse(none), Err(TargetError::Empty)));
    }

    #[test]
    fn set_keeps_load_order() {
        let set = TargetSet::parse(["http://a:1", "http://b:2", "https://c:3"]).unwrap();
        let hosts: Vec<_> = set.iter().map(|t| t.base_url().host_str().unwrap()).collect();
        assert_eq!(hosts, ["a", "b", "c"]);
    }

    #[test]
    fn one_bad_entry_fails_the_set() {
        let result = TargetSet::parse(["http://a:1", "ftp://b"]);
        assert!(matches!(result, Err(TargetError::Scheme { .. })));
    }

    #[test]
    fn join_appends_path_and_query() {
        let target = Target::parse("http://backend:9000").unwrap();
        let url = target.join("/api/items?id=7").unwrap();
        assert_eq!(url.as_str(), "http://backend:9000/api/items?id=7");

        let prefixed = Target::parse("https://backend/base/").unwrap();
        let url = prefixed.join("/x").unwrap();
        assert_eq!(url.as_str(), "https://backend/base/x");
    }
}
