use super::component::Component;
use crate::error::{LifeError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Order components so that each one follows all of its registered dependencies.
///
/// Traversal starts from every component nobody depends on, in registration order, and emits
/// each one's transitive dependencies before the component itself. Reversing the result gives
/// the shutdown order.
pub fn sort_by_dependency(components: &[Arc<Component>]) -> Result<Vec<Arc<Component>>> {
    let index: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name(), i))
        .collect();

    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(components.len());
    for component in components {
        let mut targets = Vec::new();
        for dep in component.depends() {
            match index.get(dep.as_str()) {
                Some(&target) => targets.push(target),
                None => warn!(
                    "Warning: \"{}\" depends on not exist package \"{}\"",
                    component.name(),
                    dep
                ),
            }
        }
        edges.push(targets);
    }

    let referenced: HashSet<&str> = components
        .iter()
        .flat_map(|c| c.depends().iter().map(String::as_str))
        .collect();

    let mut walk = Walk {
        edges: &edges,
        placed: vec![false; components.len()],
        visiting: vec![false; components.len()],
        order: Vec::with_capacity(components.len()),
    };

    for (i, component) in components.iter().enumerate() {
        if !referenced.contains(component.name()) && !walk.visit(i) {
            return Err(cycle_error(components));
        }
    }

    if walk.order.len() != components.len() {
        return Err(cycle_error(components));
    }

    Ok(walk.order.into_iter().map(|i| Arc::clone(&components[i])).collect())
}

struct Walk<'a> {
    edges: &'a [Vec<usize>],
    placed: Vec<bool>,
    visiting: Vec<bool>,
    order: Vec<usize>,
}

impl Walk<'_> {
    /// Depth-first post-order visit. Returns false when a cycle is reachable from `node`.
    fn visit(&mut self, node: usize) -> bool {
        if self.placed[node] {
            return true;
        }
        if self.visiting[node] {
            return false;
        }

        self.visiting[node] = true;
        for &dep in &self.edges[node] {
            if !self.visit(dep) {
                return false;
            }
        }
        self.visiting[node] = false;

        self.placed[node] = true;
        self.order.push(node);
        true
    }
}

fn cycle_error(components: &[Arc<Component>]) -> LifeError {
    let edges = components
        .iter()
        .filter(|c| !c.depends().is_empty())
        .map(|c| format!("\n\t{} -> {}", c.name(), c.depends().join(", ")))
        .collect();
    LifeError::DependencyCycle { edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, depends: &[&str]) -> Arc<Component> {
        Arc::new(Component::new(name).depends_on(depends.iter().copied()))
    }

    fn names(order: &[Arc<Component>]) -> Vec<&str> {
        order.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_no_dependencies_keeps_registration_order() {
        let components = vec![
            component("pkg1", &[]),
            component("pkg2", &[]),
            component("pkg3", &[]),
        ];
        let order = sort_by_dependency(&components).unwrap();
        assert_eq!(names(&order), ["pkg1", "pkg2", "pkg3"]);
    }

    #[test]
    fn test_dependency_registered_later_starts_first() {
        let components = vec![component("pkg2", &["pkg1"]), component("pkg1", &[])];
        let order = sort_by_dependency(&components).unwrap();
        assert_eq!(names(&order), ["pkg1", "pkg2"]);
    }

    #[test]
    fn test_shared_dependency() {
        let components = vec![component("a", &["b"]), component("b", &[]), component("c", &["b"])];
        let order = sort_by_dependency(&components).unwrap();
        assert_eq!(names(&order), ["b", "a", "c"]);
    }

    #[test]
    fn test_missing_dependency_is_ignored() {
        let components = vec![component("a", &["ghost"]), component("b", &["a"])];
        let order = sort_by_dependency(&components).unwrap();
        assert_eq!(names(&order), ["a", "b"]);
    }

    #[test]
    fn test_diamond_places_every_component_once() {
        let components = vec![
            component("app", &["http", "worker"]),
            component("http", &["db", "config"]),
            component("worker", &["db"]),
            component("db", &["config"]),
            component("config", &[]),
            component("metrics", &[]),
        ];
        let order = sort_by_dependency(&components).unwrap();
        assert_eq!(order.len(), components.len());

        let position: HashMap<&str, usize> =
            order.iter().enumerate().map(|(i, c)| (c.name(), i)).collect();
        for c in &components {
            for dep in c.depends() {
                assert!(
                    position[dep.as_str()] < position[c.name()],
                    "{} must start after {}",
                    c.name(),
                    dep
                );
            }
        }
        assert_eq!(names(&order), ["config", "db", "http", "worker", "app", "metrics"]);
    }

    #[test]
    fn test_loop_dependency() {
        let components = vec![
            component("pkg1", &["pkg2", "pkg3"]),
            component("pkg2", &["pkg1"]),
            component("pkg3", &[]),
        ];
        let err = sort_by_dependency(&components).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Loop dependency detected\n\tpkg1 -> pkg2, pkg3\n\tpkg2 -> pkg1"
        );
    }

    #[test]
    fn test_cycle_reachable_from_entry_point() {
        let components = vec![
            component("app", &["a"]),
            component("a", &["b"]),
            component("b", &["a"]),
        ];
        assert!(matches!(
            sort_by_dependency(&components),
            Err(LifeError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let components = vec![component("a", &["a"])];
        assert!(matches!(
            sort_by_dependency(&components),
            Err(LifeError::DependencyCycle { .. })
        ));
    }
}
