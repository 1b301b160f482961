//! Integration tests for the tree view controller and checkbox cascade.

use std::sync::Arc;

use horizon_treeview::{
    CheckState, NodeId, NodeProperty, Tree, TreeError, TreeNodeData, TreeView, TreeViewConfig,
};
use parking_lot::Mutex;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
struct Option_ {
    label: String,
}

impl TreeNodeData for Option_ {
    fn text(&self) -> String {
        self.label.clone()
    }

    fn is_checkable(&self) -> bool {
        true
    }
}

fn option(label: &str) -> Option_ {
    Option_ {
        label: label.to_string(),
    }
}

/// features
/// ├── editor: spelling, grammar, themes
/// └── network: proxy
fn features() -> (Tree<Option_>, NodeId, NodeId, Vec<NodeId>, NodeId) {
    let mut tree = Tree::new();
    let root = tree.create_node(option("features"));
    let editor = tree.add_child(root, option("editor")).unwrap();
    let leaves = ["spelling", "grammar", "themes"]
        .into_iter()
        .map(|l| tree.add_child(editor, option(l)).unwrap())
        .collect();
    let network = tree.add_child(root, option("network")).unwrap();
    tree.add_child(network, option("proxy")).unwrap();
    (tree, root, editor, leaves, network)
}

#[test]
fn checkbox_scenario_through_view() {
    setup();
    let (tree, root, editor, leaves, network) = features();
    let mut view = TreeView::new(tree, TreeViewConfig::new().with_checkboxes(true));
    view.set_root(root).unwrap();

    view.set_checked(leaves[0], true).unwrap();
    view.set_checked(leaves[1], true).unwrap();
    assert_eq!(view.tree().check_state(editor), CheckState::PartiallyChecked);
    assert_eq!(view.tree().check_state(root), CheckState::PartiallyChecked);

    view.set_checked(leaves[2], true).unwrap();
    assert_eq!(view.tree().check_state(editor), CheckState::Checked);
    assert_eq!(view.tree().check_state(root), CheckState::PartiallyChecked);

    view.set_checked(network, true).unwrap();
    assert_eq!(view.tree().check_state(root), CheckState::Checked);

    view.set_checked(root, false).unwrap();
    for id in view.tree().descendants(root) {
        assert_eq!(view.tree().check_state(id), CheckState::Unchecked);
    }
}

#[test]
fn check_notifications_cover_every_changed_node() {
    setup();
    let (mut tree, root, editor, leaves, _) = features();
    let changed = Arc::new(Mutex::new(Vec::new()));
    let sink = changed.clone();
    tree.signals().property_changed.connect(move |&(id, property)| {
        if property == NodeProperty::CheckState {
            sink.lock().push(id);
        }
    });

    tree.set_checked(editor, true).unwrap();
    let mut changed = changed.lock().clone();
    changed.sort();
    let mut expected = vec![editor, root];
    expected.extend(leaves);
    expected.sort();
    assert_eq!(changed, expected);
}

#[test]
fn focus_survives_until_its_rows_disappear() {
    setup();
    let (tree, root, editor, leaves, network) = features();
    let config = TreeViewConfig::new().with_show_root(false).with_viewport_rows(3);
    let mut view = TreeView::new(tree, config);
    view.set_root(root).unwrap();

    view.focus_node(leaves[2]).unwrap();
    assert!(view.has_pending_work());
    view.process_idle();
    assert_eq!(view.focused_node(), Some(leaves[2]));
    assert_eq!(view.tree().index_of(leaves[2]), Some(3));
    assert!(view.visible_range().contains(&3));

    view.set_hidden(editor, true).unwrap();
    // Nothing precedes the removed block, so focus lands on the new first row.
    assert_eq!(view.tree().node_at(0), Some(network));
    assert_eq!(view.focused_node(), Some(network));
    assert!(!view.tree().is_selected(leaves[2]));
}

#[test]
fn errors_leave_view_untouched() {
    setup();
    let (tree, root, editor, ..) = features();
    let mut view = TreeView::new(tree, TreeViewConfig::default());

    assert!(matches!(
        view.scroll_into_view(editor),
        Err(TreeError::NotVisible(_))
    ));
    view.set_root(root).unwrap();
    assert!(!view.has_pending_work());

    let removed = view.tree_mut().create_node(option("gone"));
    view.tree_mut().remove_node(removed).unwrap();
    assert!(matches!(
        view.set_expanded(removed, true),
        Err(TreeError::InvalidNode(_))
    ));
}

#[test]
fn config_loaded_from_toml_drives_view() {
    setup();
    let config = TreeViewConfig::from_toml_str(
        r#"
        show_root = false
        viewport_rows = 2
        idle_batch_size = 1
        "#,
    )
    .unwrap();
    let (tree, root, editor, leaves, _) = features();
    let mut view = TreeView::new(tree, config);
    view.set_root(root).unwrap();

    view.focus_node(leaves[0]).unwrap();
    // One continuation per tick: the scroll runs first, the focus next.
    assert_eq!(view.process_idle(), 1);
    assert_eq!(view.focused_node(), None);
    assert_eq!(view.process_idle(), 1);
    assert_eq!(view.focused_node(), Some(leaves[0]));
    assert!(view.tree().is_expanded(editor));
    assert_eq!(view.visible_rows().len(), 2);
}
