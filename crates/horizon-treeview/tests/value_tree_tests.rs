//! Browsing structured values through the tree view.

use std::sync::Arc;

use horizon_treeview::value::{ValueKind, ValueLoader, ValueNode};
use horizon_treeview::{NodeId, Tree, TreeView, TreeViewConfig};
use parking_lot::Mutex;
use serde_json::{Value, json};

fn address_book(people: usize) -> Value {
    let people: Vec<Value> = (0..people)
        .map(|i| {
            let phones: Vec<Value> = (0..3)
                .map(|j| json!({ "number": (5 * i + 3 * j).to_string(), "type": j }))
                .collect();
            json!({
                "email": format!("test{i}@test.com"),
                "id": i,
                "name": format!("Person {}", i * 10),
                "phones": phones,
            })
        })
        .collect();
    json!({ "people": people })
}

fn child_named(tree: &Tree<ValueNode>, parent: NodeId, name: &str) -> NodeId {
    tree.children(parent)
        .unwrap()
        .iter()
        .copied()
        .find(|&id| tree.data(id).unwrap().name() == name)
        .unwrap_or_else(|| panic!("no child named {name}"))
}

fn book_view(people: usize) -> (TreeView<ValueNode>, NodeId) {
    let loader = ValueLoader::new();
    let mut tree = Tree::new();
    let root = loader.create_root(&mut tree, "book", address_book(people));
    tree.set_loader(loader);
    let mut view = TreeView::new(tree, TreeViewConfig::new().with_show_root(false));
    view.set_root(root).unwrap();
    (view, root)
}

#[test]
fn address_book_loads_level_by_level() {
    let (mut view, root) = book_view(10);

    // Hiding the root row expands it, which loads its single field.
    assert_eq!(view.tree().count(), 1);
    let people = child_named(view.tree(), root, "people");
    assert!(view.tree().lazy_loading(people));
    assert_eq!(view.tree().child_count(people), 0);

    view.set_expanded(people, true).unwrap();
    assert_eq!(view.tree().count(), 11);
    assert_eq!(view.tree().data(people).unwrap().data_type(), "Repeated<message>");

    let person = child_named(view.tree(), people, "people [3]");
    assert_eq!(view.tree().index_of(person), Some(4));
    view.set_expanded(person, true).unwrap();
    assert_eq!(view.tree().count(), 15);

    let name = child_named(view.tree(), person, "name");
    let data = view.tree().data(name).unwrap();
    assert_eq!(data.kind(), ValueKind::Field);
    assert_eq!(data.field_value(), Some("Person 30"));
    assert_eq!(data.full_name(), "book.people[3].name");

    let phones = child_named(view.tree(), person, "phones");
    view.set_expanded(phones, true).unwrap();
    assert_eq!(view.tree().count(), 18);

    let third = child_named(view.tree(), phones, "phones [2]");
    view.set_expanded(third, true).unwrap();
    let number = child_named(view.tree(), third, "number");
    assert_eq!(view.tree().data(number).unwrap().field_value(), Some("21"));
    assert_eq!(view.tree().data(number).unwrap().full_name(), "book.people[3].phones[2].number");
}

#[test]
fn each_expansion_is_one_row_insert() {
    let (mut view, root) = book_view(4);
    let inserts = Arc::new(Mutex::new(Vec::new()));
    let sink = inserts.clone();
    view.tree()
        .signals()
        .rows_inserted
        .connect(move |(index, nodes)| sink.lock().push((*index, nodes.len())));

    let people = child_named(view.tree(), root, "people");
    view.set_expanded(people, true).unwrap();
    let person = child_named(view.tree(), people, "people [0]");
    view.set_expanded(person, true).unwrap();

    assert_eq!(*inserts.lock(), vec![(1, 4), (2, 4)]);
}

#[test]
fn collapsing_keeps_loaded_children() {
    let (mut view, root) = book_view(2);
    let people = child_named(view.tree(), root, "people");
    view.set_expanded(people, true).unwrap();
    view.set_expanded(people, false).unwrap();

    assert_eq!(view.tree().count(), 1);
    assert_eq!(view.tree().child_count(people), 2);
    assert!(!view.tree().lazy_loading(people));

    view.set_expanded(people, true).unwrap();
    assert_eq!(view.tree().count(), 3);
    assert_eq!(view.tree().child_count(people), 2);
}
