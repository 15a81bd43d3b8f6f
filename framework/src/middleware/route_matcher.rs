//! Path patterns used to scope middleware to routes
//!
//! Three forms are supported:
//! - exact paths: `/health`
//! - wildcards: `/admin/*` (`*` matches anything, including `/`)
//! - placeholders: `/users/{id}/edit` (`{id}` matches one path segment)

use crate::error::{FrameworkError, Result};
use regex::Regex;

#[derive(Debug, Clone)]
enum Rule {
    Exact(String),
    Pattern(Regex),
}

impl Rule {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == path,
            Self::Pattern(regex) => regex.is_match(path),
        }
    }
}

/// Matches request paths against a list of patterns
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    rules: Vec<Rule>,
}

impl RouteMatcher {
    /// Compile the given patterns
    ///
    /// # Example
    ///
    /// ```rust
    /// use kit::middleware::RouteMatcher;
    ///
    /// let matcher = RouteMatcher::new(["/admin/*", "/users/{id}"]).unwrap();
    /// assert!(matcher.matches("/admin/settings"));
    /// assert!(matcher.matches("/users/42"));
    /// assert!(!matcher.matches("/users/42/edit"));
    /// ```
    pub fn new<I>(patterns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|pattern| compile(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// True if any pattern matches `path`
    pub fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }
}

fn compile(pattern: &str) -> Result<Rule> {
    if !pattern.contains('*') && !pattern.contains('{') {
        return Ok(Rule::Exact(pattern.to_string()));
    }

    let mut regex = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(".*"),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed || name.is_empty() || name.contains('/') {
                    return Err(FrameworkError::configuration(format!(
                        "Invalid route placeholder in pattern [{}]",
                        pattern
                    )));
                }
                regex.push_str("[^/]+");
            }
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push('$');

    Regex::new(&regex).map(Rule::Pattern).map_err(|err| {
        FrameworkError::configuration(format!("Invalid route pattern [{}]: {}", pattern, err))
    })
}
