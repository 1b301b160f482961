//! Address book browser
//!
//! Builds an address book as a structured value, shows it through a
//! [`TreeView`], expands a few levels and prints the flattened rows.
//!
//! Run with: cargo run -p horizon-treeview --example address_book
//! Set `RUST_LOG=horizon_treeview=debug` to watch loads and row changes.

use horizon_treeview::value::{ValueLoader, ValueNode};
use horizon_treeview::{NodeId, Tree, TreeView, TreeViewConfig};
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
    json!({ "people": people, "owner": null, "labels": { "work": "blue", "home": "green" } })
}

fn print_rows(view: &TreeView<ValueNode>) {
    let tree = view.tree();
    for (row, id) in tree.visible_nodes().into_iter().enumerate() {
        let Some(data) = tree.data(id) else { continue };
        let indent = "  ".repeat(tree.level(id));
        let marker = if tree.show_expander(id) {
            if tree.is_expanded(id) { "-" } else { "+" }
        } else {
            " "
        };
        let value = data.field_value().map(|v| format!(" = {v}")).unwrap_or_default();
        println!("{row:>3} {indent}{marker} {} ({}){value}", data.name(), data.data_type());
    }
}

fn child_named(tree: &Tree<ValueNode>, parent: NodeId, name: &str) -> Option<NodeId> {
    tree.children(parent)
        .ok()?
        .iter()
        .copied()
        .find(|&id| tree.data(id).is_some_and(|d| d.name() == name))
}

fn main() -> horizon_treeview::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let loader = ValueLoader::new().with_map_field("labels");
    let mut tree: Tree<ValueNode> = Tree::new();
    let root = loader.create_root(&mut tree, "book", address_book(10));
    tree.set_loader(loader);

    let config = TreeViewConfig::new().with_show_root_expander(false).with_viewport_rows(12);
    let mut view = TreeView::new(tree, config);
    view.set_root(root)?;
    println!("== root opened: {} rows", view.tree().count());
    print_rows(&view);

    // Each level loads on first expansion.
    if let Some(people) = child_named(view.tree(), root, "people") {
        view.set_expanded(people, true)?;
        if let Some(person) = child_named(view.tree(), people, "people [1]") {
            view.set_expanded(person, true)?;
            if let Some(phones) = child_named(view.tree(), person, "phones") {
                view.set_expanded(phones, true)?;
            }
            view.focus_node(person)?;
        }
    }
    while view.has_pending_work() {
        view.process_idle();
    }

    println!("\n== after expanding: {} rows", view.tree().count());
    print_rows(&view);
    println!(
        "\nviewport {:?}, focused {:?}",
        view.visible_range(),
        view.focused_node().and_then(|id| view.tree().data(id)).map(|d| d.full_name().to_string())
    );

    println!("\n{}", view.tree().dump(root));
    Ok(())
}
