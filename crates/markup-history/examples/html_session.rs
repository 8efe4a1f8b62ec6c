//! HTML editing session example
//!
//! Types a small document keystroke by keystroke, then walks the history back and forth.

use markup_history::{HistoryConfig, HistoryManager, MarkupBuffer, MemoryStore, TextWidget};

fn main() {
    let mut manager =
        HistoryManager::with_config(MarkupBuffer::new(""), HistoryConfig::unbatched());
    manager.subscribe(|change| {
        println!(
            "  [{:?}] undo={} redo={} v{}",
            change.kind, change.state.undo_depth, change.state.redo_depth, change.state.version
        );
    });

    println!("1. Typing:");
    let document = "<ul>\n<li>first item</li>\n</ul>";
    for (i, ch) in document.chars().enumerate() {
        manager.edit(i, i, &ch.to_string()).expect("edit in range");
    }
    println!("{}\n", manager.widget().text());

    println!("2. Undo step by step:");
    while manager.undo() {
        println!("{:?}", manager.widget().text());
    }

    println!("\n3. Redo everything:");
    while manager.redo() {}
    println!("{}", manager.widget().text());

    println!("\n4. Save and restore:");
    let mut store = MemoryStore::new();
    manager.store(&mut store, "session");
    println!("  {} keys stored", store.len());
    let mut reopened = HistoryManager::new(MarkupBuffer::new(&manager.widget().text()));
    println!("  restored: {}", reopened.restore(&store, "session"));
    println!("  can undo: {}", reopened.can_undo());
}
