use std::collections::HashMap;

use crate::errors::RegistryError;
use crate::route::RouteDefinition;

/// An ordered, immutable-after-build collection of [`RouteDefinition`]s, per
/// `spec.md` §4.2. Matching is linear first-hit by registration order: more
/// specific patterns must be registered before general ones.
pub struct RouteRegistry {
    routes: Vec<RouteDefinition>,
}

#[derive(Debug, Default)]
pub struct RouteRegistryBuilder {
    routes: Vec<RouteDefinition>,
}

impl RouteRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, route: RouteDefinition) -> Result<Self, RegistryError> {
        if self.routes.iter().any(|r| r.name == route.name) {
            return Err(RegistryError::DuplicateName(route.name));
        }
        self.routes.push(route);
        Ok(self)
    }

    /// Freezes the registry. Registration outside process init is a caller
    /// error by construction: once built there is no `register` method left
    /// to call.
    #[must_use]
    pub fn build(self) -> RouteRegistry {
        RouteRegistry {
            routes: self.routes,
        }
    }
}

impl RouteRegistry {
    /// Returns the first route (by registration order) whose pattern matches
    /// `path`, along with its named capture groups.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&RouteDefinition, HashMap<String, String>)> {
        for route in &self.routes {
            if let Some(captures) = route.pattern.captures(path) {
                let mut params = HashMap::new();
                for name in route.pattern.capture_names().flatten() {
                    if let Some(value) = captures.name(name) {
                        params.insert(name.to_string(), value.as_str().to_string());
                    }
                }
                return Some((route, params));
            }
        }
        None
    }

    /// Resolves a route by its stable name — the operation a worker performs
    /// against its independently-loaded copy of the registry, per `spec.md`
    /// §4.1's invariant that "the route identity resolves in every worker".
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&RouteDefinition> {
        self.routes.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteDefinitionBuilder;
    use std::sync::Arc;

    fn ok_renderer() -> crate::route::Renderer {
        Arc::new(|_data, _ctx| Ok("<html></html>".to_string()))
    }

    #[test]
    fn match_is_order_deterministic_on_overlap() {
        let specific = RouteDefinitionBuilder::new("specific", "^/api/echo$", ok_renderer())
            .build()
            .unwrap();
        let general = RouteDefinitionBuilder::new("general", "^/api/.*$", ok_renderer())
            .build()
            .unwrap();

        let registry = RouteRegistryBuilder::new()
            .register(specific)
            .unwrap()
            .register(general)
            .unwrap()
            .build();

        let (matched, _) = registry.match_path("/api/echo").unwrap();
        assert_eq!(matched.name, "specific");

        let (matched_general, _) = registry.match_path("/api/other").unwrap();
        assert_eq!(matched_general.name, "general");
    }

    #[test]
    fn duplicate_name_is_rejected_at_build_time() {
        let route_a = RouteDefinitionBuilder::new("dup", "^/a$", ok_renderer())
            .build()
            .unwrap();
        let route_b = RouteDefinitionBuilder::new("dup", "^/b$", ok_renderer())
            .build()
            .unwrap();

        let err = RouteRegistryBuilder::new()
            .register(route_a)
            .unwrap()
            .register(route_b)
            .unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "dup"));
    }

    #[test]
    fn unmatched_path_returns_none() {
        let registry = RouteRegistryBuilder::new().build();
        assert!(registry.match_path("/anything").is_none());
    }

    #[test]
    fn named_captures_are_surfaced() {
        let route = RouteDefinitionBuilder::new("item", r"^/items/(?P<id>\d+)$", ok_renderer())
            .build()
            .unwrap();
        let registry = RouteRegistryBuilder::new().register(route).unwrap().build();

        let (_, params) = registry.match_path("/items/42").unwrap();
        assert_eq!(params.get("id").unwrap(), "42");
    }
}
