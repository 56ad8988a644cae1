//! Parameterized path templates (`/users/:id`).
//!
//! A template is compiled once, at registration time, into an anchored regex
//! with one named capture group per `:name` segment. Literal segments are
//! escaped and must match exactly; parameter segments accept one or more
//! URL-safe characters. A single trailing `/` is optional on both the template
//! and the candidate path.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::ParamVec;
use crate::error::PatternError;

/// Marker that introduces a parameter segment.
pub const PARAM_MARKER: char = ':';

/// Characters a parameter segment may contain.
const URL_SAFE_CLASS: &str = r"[0-9a-zA-Z_~.!()'!:,@;-]";

/// Compiled path template.
#[derive(Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl Pattern {
    /// Compile a template such as `/users/:id/posts/:title`.
    ///
    /// # Errors
    ///
    /// Fails if the template is empty, contains `//`, has a marker with an
    /// empty or non-identifier name, or repeats a parameter name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use switchyard::router::Pattern;
    ///
    /// let pattern = Pattern::compile("/users/:id").unwrap();
    /// let params = pattern.match_path("/users/42/").unwrap();
    /// assert_eq!(params[0].1, "42");
    /// ```
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        if template.is_empty() {
            return Err(PatternError::Empty);
        }
        if template.contains("//") {
            return Err(PatternError::AdjacentSeparators {
                template: template.to_string(),
            });
        }

        // Trailing separator is optional on input; the regex adds `/?` itself.
        let body = template.strip_suffix('/').unwrap_or(template);

        let mut source = String::with_capacity(body.len() * 2 + 8);
        source.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(body.matches(PARAM_MARKER).count());

        for segment in body.split('/') {
            if let Some(name) = segment.strip_prefix(PARAM_MARKER) {
                if !is_valid_param_name(name) {
                    return Err(PatternError::InvalidParameterName {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                if param_names.iter().any(|existing| existing.as_ref() == name) {
                    return Err(PatternError::DuplicateParameter {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                source.push_str("(?P<");
                source.push_str(name);
                source.push('>');
                source.push_str(URL_SAFE_CLASS);
                source.push_str("+)/");
                param_names.push(Arc::from(name));
            } else {
                source.push_str(&regex::escape(segment));
                source.push('/');
            }
        }
        source.push_str("?$");

        let regex = Regex::new(&source).map_err(|source| PatternError::Regex {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
        })
    }

    /// The template this pattern was compiled from, as given.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in template order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Match `path` and extract the parameters.
    ///
    /// Returns `None` when the segment count or any literal segment differs,
    /// or when a parameter segment contains characters outside the URL-safe
    /// class.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for name in &self.param_names {
            if let Some(value) = captures.name(name) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(params)
    }

    /// Boolean form of [`Pattern::match_path`]; does not allocate.
    #[inline]
    #[must_use]
    pub fn test(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("template", &self.template)
            .field("params", &self.param_names)
            .finish()
    }
}

/// Names become regex group names, so they must be identifiers.
fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
