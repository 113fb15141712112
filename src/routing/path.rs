use regex::Regex;

/// Working path and query extracted from a request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub path: String,
    pub query: Option<String>,
    /// `false` when the URI did not fit the pattern and was used verbatim.
    pub matched: bool,
}

/// Splits `/<base>/<segment>?<query>#<fragment>` into `/<segment>` and
/// `<query>`.
///
/// A segment is letters, digits, `-` and `_`. Anything else (nested paths,
/// the bare `/`, a missing base prefix) falls back to the raw URI as the path
/// with no query.
#[derive(Debug, Clone)]
pub struct PathParser {
    base: String,
    pattern: Regex,
}

impl PathParser {
    /// `base` may carry leading/trailing slashes; they are ignored.
    pub fn new(base: &str) -> Result<Self, regex::Error> {
        let base = base.trim().trim_matches('/').to_string();

        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("/{}", regex::escape(&base))
        };

        let pattern = Regex::new(&format!(
            r"^{prefix}/([A-Za-z0-9_-]+)(?:\?([^#]*))?(?:#.*)?$"
        ))?;

        Ok(Self { base, pattern })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn parse(&self, uri: &str) -> ParsedPath {
        match self.pattern.captures(uri) {
            Some(caps) => ParsedPath {
                path: format!("/{}", &caps[1]),
                query: caps.get(2).map(|m| m.as_str().to_string()),
                matched: true,
            },
            None => ParsedPath {
                path: uri.to_string(),
                query: None,
                matched: false,
            },
        }
    }
}
