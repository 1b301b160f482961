//! One-shot deferred child materialization.
//!
//! A node armed with [`Tree::set_lazy_loading`] has its children produced by
//! the tree's [`ChildLoader`] the first time they are needed, typically when
//! the node is first expanded. The flag is cleared before the provider runs,
//! so each arming triggers at most one load, even when the provider fails.

use std::sync::Arc;

use horizon_treeview_core::PerfSpan;
use horizon_treeview_core::logging::{span_names, targets};

use crate::error::{LoadError, LoadResult, Result, TreeError};
use crate::node::{NodeId, NodeProperty, TreeNodeData};
use crate::tree::Tree;

/// Produces the children of lazily-loaded nodes.
///
/// The provider receives the whole tree and populates `node` through the
/// ordinary insertion methods. It may arm lazy loading on the children it
/// creates.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use horizon_treeview::{LoadResult, NodeId, Tree};
///
/// let mut tree: Tree<String> = Tree::new();
/// tree.set_loader(|tree: &mut Tree<String>, node: NodeId| -> LoadResult {
///     for i in 0..3 {
///         tree.add_child(node, format!("child {i}"))?;
///     }
///     Ok(())
/// });
///
/// let root = tree.create_node("root".to_string());
/// tree.set_lazy_loading(root, true).unwrap();
/// tree.set_expanded(root, true).unwrap();
/// assert_eq!(tree.child_count(root), 3);
/// ```
pub trait ChildLoader<T> {
    /// Populate the children of `node`.
    fn load_children(&self, tree: &mut Tree<T>, node: NodeId) -> LoadResult;
}

impl<T, F> ChildLoader<T> for F
where
    F: Fn(&mut Tree<T>, NodeId) -> LoadResult,
{
    fn load_children(&self, tree: &mut Tree<T>, node: NodeId) -> LoadResult {
        self(tree, node)
    }
}

impl<T: TreeNodeData> Tree<T> {
    /// Create an empty tree that loads lazy children with `loader`.
    pub fn with_loader(loader: impl ChildLoader<T> + 'static) -> Self {
        let mut tree = Self::new();
        tree.set_loader(loader);
        tree
    }

    /// Install the provider used for lazy nodes, replacing any previous one.
    pub fn set_loader(&mut self, loader: impl ChildLoader<T> + 'static) {
        self.loader = Some(Arc::new(loader));
    }

    /// Install a shared provider.
    pub fn set_shared_loader(&mut self, loader: Arc<dyn ChildLoader<T>>) {
        self.loader = Some(loader);
    }

    /// Whether the node's children are still to be loaded.
    pub fn lazy_loading(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.lazy_loading)
    }

    /// Arm or disarm lazy loading.
    ///
    /// Arming collapses the node and withdraws its permission to be expanded
    /// recursively, so a bulk expansion never triggers the load.
    pub fn set_lazy_loading(&mut self, id: NodeId, lazy: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.lazy_loading != lazy {
            node.lazy_loading = lazy;
            self.emit_property(id, NodeProperty::LazyLoading);
            self.emit_property(id, NodeProperty::ShowExpander);
        }
        if lazy {
            self.set_expanded(id, false)?;
            self.set_can_expand_recursively(id, false)?;
        }
        Ok(())
    }

    /// Whether a recursive expansion may expand this node.
    ///
    /// Always `false` while lazy loading is armed.
    pub fn can_expand_recursively(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.can_expand_recursively && !n.lazy_loading)
    }

    /// Allow or forbid recursive expansion of this node.
    pub fn set_can_expand_recursively(&mut self, id: NodeId, allowed: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.can_expand_recursively != allowed {
            node.can_expand_recursively = allowed;
            self.emit_property(id, NodeProperty::CanExpandRecursively);
        }
        Ok(())
    }

    /// Load the node's children if lazy loading is armed.
    ///
    /// Returns `Ok(true)` when the provider ran. A second call is a no-op
    /// until lazy loading is armed again.
    pub fn ensure_children_loaded(&mut self, id: NodeId) -> Result<bool> {
        let node = self.node_mut(id)?;
        if !node.lazy_loading {
            return Ok(false);
        }
        node.lazy_loading = false;
        self.emit_property(id, NodeProperty::LazyLoading);
        self.emit_property(id, NodeProperty::ShowExpander);

        let Some(loader) = self.loader.clone() else {
            let text = self.nodes[id].data.text();
            tracing::warn!(target: targets::LAZY, ?id, %text, "lazy node has no child provider");
            return Err(TreeError::load(id, LoadError::Unsupported(text)));
        };

        let _span = PerfSpan::new(span_names::LAZY_LOAD);
        match loader.load_children(self, id) {
            Ok(()) => {
                tracing::debug!(target: targets::LAZY, ?id, children = self.child_count(id), "loaded children");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: targets::LAZY, ?id, error = %err, "child provider failed");
                Err(TreeError::load(id, err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_loader(calls: Arc<AtomicUsize>) -> impl ChildLoader<String> {
        move |tree: &mut Tree<String>, node: NodeId| -> LoadResult {
            calls.fetch_add(1, Ordering::SeqCst);
            tree.add_child(node, "x".into())?;
            tree.add_child(node, "y".into())?;
            Ok(())
        }
    }

    #[test]
    fn test_load_happens_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tree = Tree::with_loader(counting_loader(calls.clone()));
        let root = tree.create_node("root".to_string());
        tree.set_lazy_loading(root, true).unwrap();
        assert!(tree.show_expander(root));
        assert!(!tree.can_expand_recursively(root));

        tree.set_expanded(root, true).unwrap();
        tree.set_expanded(root, false).unwrap();
        tree.set_expanded(root, true).unwrap();
        assert!(!tree.ensure_children_loaded(root).unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tree.child_count(root), 2);
        assert!(!tree.lazy_loading(root));
        assert_eq!(tree.visible_subtree_count(root), 3);
    }

    #[test]
    fn test_rearming_loads_again_and_collapses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tree = Tree::with_loader(counting_loader(calls.clone()));
        let root = tree.create_node("root".to_string());
        tree.set_lazy_loading(root, true).unwrap();
        tree.set_expanded(root, true).unwrap();

        tree.set_lazy_loading(root, true).unwrap();
        assert!(!tree.is_expanded(root));

        tree.set_expanded(root, true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(tree.child_count(root), 4);
    }

    #[test]
    fn test_missing_loader_is_unsupported() {
        let mut tree: Tree<String> = Tree::new();
        let root = tree.create_node("root".into());
        tree.set_lazy_loading(root, true).unwrap();

        let err = tree.set_expanded(root, true).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Load {
                source: LoadError::Unsupported(_),
                ..
            }
        ));
        assert!(!tree.lazy_loading(root));
        assert!(!tree.is_expanded(root));

        // The flag stays cleared, so the next expansion just proceeds.
        assert!(tree.set_expanded(root, true).unwrap());
    }

    #[test]
    fn test_provider_failure_propagates() {
        let mut tree = Tree::with_loader(|_: &mut Tree<String>, _: NodeId| -> LoadResult {
            Err(LoadError::provider("backend offline"))
        });
        let root = tree.create_node("root".to_string());
        tree.set_lazy_loading(root, true).unwrap();

        let err = tree.ensure_children_loaded(root).unwrap_err();
        assert!(err.to_string().contains("backend offline"));
        assert!(!tree.lazy_loading(root));
    }

    #[test]
    fn test_lazy_flag_changes_report_expander() {
        let mut tree = Tree::with_loader(|_: &mut Tree<String>, _: NodeId| -> LoadResult { Ok(()) });
        let root = tree.create_node("root".to_string());
        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = events.clone();
        tree.signals().property_changed.connect(move |&(id, prop)| {
            if prop == NodeProperty::ShowExpander {
                sink.lock().push(id);
            }
        });

        tree.set_lazy_loading(root, true).unwrap();
        assert_eq!(*events.lock(), vec![root]);
        tree.set_lazy_loading(root, true).unwrap();
        assert_eq!(events.lock().len(), 1);

        tree.ensure_children_loaded(root).unwrap();
        assert_eq!(*events.lock(), vec![root, root]);
        assert!(!tree.show_expander(root));
    }

    #[test]
    fn test_recursive_permission_restores_after_load() {
        let mut tree = Tree::with_loader(|_: &mut Tree<String>, _: NodeId| -> LoadResult { Ok(()) });
        let root = tree.create_node("root".to_string());
        tree.set_lazy_loading(root, true).unwrap();
        tree.ensure_children_loaded(root).unwrap();

        assert!(!tree.can_expand_recursively(root));
        tree.set_can_expand_recursively(root, true).unwrap();
        assert!(tree.can_expand_recursively(root));
    }
}
