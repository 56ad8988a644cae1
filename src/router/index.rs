//! Route index: the three disjoint route collections of an owner.
//!
//! - literal table, keyed by normalised path (holds the `*` wildcard too)
//! - pattern routes, in registration order, keyed by template
//! - regex routes, in registration order, keyed by regex source
//!
//! Registering a path that already exists merges the new method handler into
//! the existing [`Route`] instead of creating a second one.

use http::Method;
use std::collections::HashMap;
use std::fmt;

use super::route::{normalize_literal, HandlerEntry, Route, RouteMethod, RoutePath, WILDCARD_PATH};
use super::ParamVec;

/// Which collection produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Literal,
    Pattern,
    Regex,
    Wildcard,
}

impl MatchStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStage::Literal => "literal",
            MatchStage::Pattern => "pattern",
            MatchStage::Regex => "regex",
            MatchStage::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route that matched the lookup path and has a handler for the method.
#[derive(Debug)]
pub struct RouteHit<'r> {
    pub route: &'r Route,
    pub entry: &'r HandlerEntry,
    /// Extracted parameters (pattern routes only).
    pub params: Option<ParamVec>,
    pub stage: MatchStage,
}

/// Outcome of [`RouteIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// First registration of this path.
    Created,
    /// Path existed; a new method slot was filled.
    Merged,
    /// Path and method existed; the previous handler was replaced.
    Replaced,
}

#[derive(Debug, Default)]
pub struct RouteIndex {
    literals: HashMap<String, Route>,
    patterns: Vec<Route>,
    pattern_keys: HashMap<String, usize>,
    regexes: Vec<Route>,
    regex_keys: HashMap<String, usize>,
}

impl RouteIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` for `method` on `path`, merging with an existing route.
    pub fn insert(&mut self, path: RoutePath, method: RouteMethod, entry: HandlerEntry) -> Insertion {
        let key = path.key().to_string();
        let route = match path {
            RoutePath::Literal(_) => self.literals.entry(key).or_insert_with(|| Route::new(path)),
            RoutePath::Pattern(_) => {
                Self::ordered_slot(&mut self.patterns, &mut self.pattern_keys, key, path)
            }
            RoutePath::Regex(_) => {
                Self::ordered_slot(&mut self.regexes, &mut self.regex_keys, key, path)
            }
        };

        let had_any = route.methods().next().is_some();
        match route.add_handler(method, entry) {
            Some(_) => Insertion::Replaced,
            None if had_any => Insertion::Merged,
            None => Insertion::Created,
        }
    }

    fn ordered_slot<'a>(
        routes: &'a mut Vec<Route>,
        keys: &mut HashMap<String, usize>,
        key: String,
        path: RoutePath,
    ) -> &'a mut Route {
        let idx = *keys.entry(key).or_insert_with(|| {
            routes.push(Route::new(path));
            routes.len() - 1
        });
        &mut routes[idx]
    }

    /// Literal route stored for `path`, regardless of method.
    #[must_use]
    pub fn literal(&self, path: &str) -> Option<&Route> {
        self.literals.get(normalize_literal(path).as_ref())
    }

    /// Pattern route stored under `template`, regardless of method.
    #[must_use]
    pub fn pattern(&self, template: &str) -> Option<&Route> {
        let key = match template.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => template,
        };
        self.pattern_keys.get(key).map(|&idx| &self.patterns[idx])
    }

    /// Regex route stored under `source`, regardless of method.
    #[must_use]
    pub fn regex(&self, source: &str) -> Option<&Route> {
        self.regex_keys.get(source).map(|&idx| &self.regexes[idx])
    }

    /// Exact literal lookup. A route without a handler for `method` (or
    /// `ANY`) is a miss.
    #[must_use]
    pub fn match_literal(&self, path: &str, method: &Method) -> Option<RouteHit<'_>> {
        let route = self.literal(path)?;
        let entry = route.resolve(method)?;
        Some(RouteHit {
            route,
            entry,
            params: None,
            stage: MatchStage::Literal,
        })
    }

    /// First pattern route, in registration order, that matches and has an
    /// applicable handler.
    #[must_use]
    pub fn match_pattern(&self, path: &str, method: &Method) -> Option<RouteHit<'_>> {
        self.patterns.iter().find_map(|route| {
            let RoutePath::Pattern(pattern) = route.path() else {
                return None;
            };
            let entry = route.resolve(method)?;
            let params = pattern.match_path(path)?;
            Some(RouteHit {
                route,
                entry,
                params: Some(params),
                stage: MatchStage::Pattern,
            })
        })
    }

    /// First regex route, in registration order, that matches and has an
    /// applicable handler.
    #[must_use]
    pub fn match_regex(&self, path: &str, method: &Method) -> Option<RouteHit<'_>> {
        self.regexes.iter().find_map(|route| {
            let RoutePath::Regex(regex) = route.path() else {
                return None;
            };
            let entry = route.resolve(method)?;
            regex.is_match(path).then_some(RouteHit {
                route,
                entry,
                params: None,
                stage: MatchStage::Regex,
            })
        })
    }

    /// The `*` catch-all, if registered for this method.
    #[must_use]
    pub fn match_wildcard(&self, method: &Method) -> Option<RouteHit<'_>> {
        let route = self.literals.get(WILDCARD_PATH)?;
        let entry = route.resolve(method)?;
        Some(RouteHit {
            route,
            entry,
            params: None,
            stage: MatchStage::Wildcard,
        })
    }

    /// Total number of routes across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len() + self.regexes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every route, literals first (unordered), then patterns and regexes in
    /// registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.literals
            .values()
            .chain(self.patterns.iter())
            .chain(self.regexes.iter())
    }
}
