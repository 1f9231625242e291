use super::types::{callback, Callback};
use crate::error::{LifeError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A named unit with optional start/stop callbacks and declared dependencies
#[derive(Clone)]
pub struct Component {
    name: String,
    on_start: Option<Callback>,
    on_shutdown: Option<Callback>,
    depends: Vec<String>,
}

impl Component {
    /// Create a component with no callbacks and no dependencies
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_shutdown: None,
            depends: Vec::new(),
        }
    }

    /// Set the callback run while the application is starting
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_start = Some(callback(f));
        self
    }

    /// Set the callback run while the application is shutting down
    pub fn on_shutdown<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_shutdown = Some(callback(f));
        self
    }

    /// Declare components that must start before this one.
    ///
    /// Names need not be registered; unknown names are ignored with a warning at start.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    pub(crate) fn start_callback(&self) -> Option<Callback> {
        self.on_start.clone()
    }

    pub(crate) fn shutdown_callback(&self) -> Option<Callback> {
        self.on_shutdown.clone()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_shutdown", &self.on_shutdown.is_some())
            .field("depends", &self.depends)
            .finish()
    }
}

/// Registered components in registration order
#[derive(Default)]
pub(crate) struct ComponentRegistry {
    components: Mutex<Vec<Arc<Component>>>,
}

impl ComponentRegistry {
    pub(crate) fn insert(&self, component: Component) -> Result<()> {
        if component.name.is_empty() {
            return Err(LifeError::EmptyName);
        }

        let mut components = self.components.lock();
        if components.iter().any(|c| c.name == component.name) {
            return Err(LifeError::DuplicateName {
                name: component.name,
            });
        }
        components.push(Arc::new(component));
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Component>> {
        self.components.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.components.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = ComponentRegistry::default();
        registry.insert(Component::new("pkg1")).unwrap();

        let err = registry.insert(Component::new("pkg1")).unwrap_err();
        assert_eq!(err.to_string(), "package 'pkg1' already registered");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = ComponentRegistry::default();
        assert!(matches!(
            registry.insert(Component::new("")),
            Err(LifeError::EmptyName)
        ));
    }

    #[test]
    fn test_builder_collects_dependencies() {
        let component = Component::new("web")
            .on_start(|| async { Ok(()) })
            .depends_on(["db", "cache"])
            .depends_on(vec!["config".to_string()]);

        assert_eq!(component.name(), "web");
        assert_eq!(component.depends(), ["db", "cache", "config"]);
        assert!(component.start_callback().is_some());
        assert!(component.shutdown_callback().is_none());
    }
}
