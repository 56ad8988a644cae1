//! Controllers: route owners mounted under a path prefix.
//!
//! The parent delegates every path the prefix covers, whole segments only:
//! prefix `/admin` takes `/admin/` and `/admin/users/` but not `/adminx/`.
//! The controller then looks up the remainder, so a controller at `/admin`
//! registers `/users` rather than `/admin/users`.

use futures::future::BoxFuture;

use super::owner::{OwnerConfig, RouteOwner, RouteRegistrar};
use crate::server::{Request, Response};

pub struct Controller {
    prefix: String,
    owner: RouteOwner,
}

impl Controller {
    /// Controller mounted at `prefix`. A trailing `/` is ignored and a
    /// missing leading `/` added.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self::with_config(prefix, OwnerConfig::default())
    }

    #[must_use]
    pub fn with_config(prefix: &str, config: OwnerConfig) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            owner: RouteOwner::with_config(config),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn owner(&self) -> &RouteOwner {
        &self.owner
    }

    /// Whether `path` falls under this controller's prefix.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.truncate(path).is_some()
    }

    /// `path` with the prefix removed, or `None` if the prefix does not
    /// cover it. The result always starts with `/`.
    #[must_use]
    pub fn truncate<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.prefix == "/" {
            return path.starts_with('/').then_some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Dispatch into this controller's own tables using the truncated path.
    /// A path outside the prefix is passed on unchanged.
    pub fn dispatch<'a>(&'a self, req: &'a mut Request, current_path: &str) -> BoxFuture<'a, Response> {
        let path = self.truncate(current_path).unwrap_or(current_path).to_string();
        self.owner.dispatch_at(req, Some(path))
    }

    /// Fill unset not-found and error handlers from the parent.
    pub(crate) fn inherit(&mut self, parent: &OwnerConfig) {
        let own = &mut self.owner;
        let config = own.config_mut();
        if config.not_found.is_none() {
            config.not_found.clone_from(&parent.not_found);
        }
        if config.error_handler.is_none() {
            config.error_handler.clone_from(&parent.error_handler);
        }
    }
}

impl RouteRegistrar for Controller {
    fn route_owner_mut(&mut self) -> &mut RouteOwner {
        &mut self.owner
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("prefix", &self.prefix)
            .field("owner", &self.owner)
            .finish()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
