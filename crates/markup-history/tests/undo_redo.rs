use markup_history::{
    ApplyError, ChangeListener, Clock, HistoryChangeKind, HistoryConfig, HistoryManager,
    MarkupBuffer, TextWidget,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn unbatched(text: &str) -> HistoryManager<MarkupBuffer> {
    HistoryManager::with_config(MarkupBuffer::new(text), HistoryConfig::unbatched())
}

/// Clock that only moves when the test advances it.
fn manual_clock() -> (Clock, Arc<AtomicU64>) {
    let base = Instant::now();
    let elapsed_ms = Arc::new(AtomicU64::new(0));
    let handle = Arc::clone(&elapsed_ms);
    let clock: Clock =
        Arc::new(move || base + Duration::from_millis(handle.load(Ordering::SeqCst)));
    (clock, elapsed_ms)
}

fn type_chars(manager: &mut HistoryManager<MarkupBuffer>, at: usize, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        manager.edit(at + i, at + i, &ch.to_string()).unwrap();
    }
}

fn text(manager: &HistoryManager<MarkupBuffer>) -> String {
    manager.widget().text()
}

#[test]
fn test_empty_history_is_a_noop() {
    let mut manager = HistoryManager::new(MarkupBuffer::new("<p>x</p>"));
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
    assert!(!manager.undo());
    assert!(!manager.redo());
    assert_eq!(text(&manager), "<p>x</p>");
}

#[test]
fn test_typing_inside_element_undoes_exactly() {
    let mut manager = HistoryManager::new(MarkupBuffer::new("<p>aaaa</p>"));
    manager.edit(7, 7, "a").unwrap();
    assert_eq!(text(&manager), "<p>aaaaa</p>");

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>aaaa</p>");
    assert_eq!(manager.widget().cursor(), 7);
    assert!(!manager.can_undo());
    assert!(manager.can_redo());

    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>aaaaa</p>");
    assert_eq!(manager.widget().cursor(), 8);
}

#[test]
fn test_element_bursts_undo_by_body_then_tag() {
    let mut manager = unbatched("");
    manager.edit(0, 0, "<p>").unwrap();
    manager.edit(3, 3, "aaaa").unwrap();
    manager.edit(7, 7, "</p>").unwrap();

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>");
    assert!(manager.undo());
    assert_eq!(text(&manager), "");
    assert!(!manager.undo());
    assert!(!manager.can_undo());

    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>");
    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>aaaa</p>");
    assert!(!manager.can_redo());
    assert!(!manager.redo());
}

#[test]
fn test_deleted_newline_is_restored() {
    let original = "<p>aaaa</p>\n<p>bbbb</p>";
    let mut manager = HistoryManager::new(MarkupBuffer::new(original));
    manager.edit(11, 12, "").unwrap();
    assert_eq!(text(&manager), "<p>aaaa</p><p>bbbb</p>");

    assert!(manager.undo());
    assert_eq!(text(&manager), original);
    assert_eq!(manager.widget().cursor(), 12);
}

#[test]
fn test_keystrokes_undo_word_by_word() {
    let mut manager = unbatched("");
    type_chars(&mut manager, 0, "<p>hello world</p>");
    assert_eq!(manager.history().len(), 18);

    let mut steps = Vec::new();
    while manager.undo() {
        steps.push(text(&manager));
    }
    assert_eq!(steps, vec!["<p>hello", "<p>", ""]);

    while manager.redo() {}
    assert_eq!(text(&manager), "<p>hello world</p>");
}

#[test]
fn test_typing_pause_splits_batches() {
    let (clock, elapsed_ms) = manual_clock();
    let mut manager = HistoryManager::new(MarkupBuffer::new("")).with_clock(clock);

    type_chars(&mut manager, 0, "hello");
    elapsed_ms.store(100, Ordering::SeqCst);
    type_chars(&mut manager, 5, " world");
    assert_eq!(manager.history().len(), 2);

    assert!(manager.undo());
    assert_eq!(text(&manager), "hello");
    assert!(manager.undo());
    assert_eq!(text(&manager), "");
}

#[test]
fn test_backspace_burst_is_one_step() {
    let (clock, _) = manual_clock();
    let mut manager = HistoryManager::new(MarkupBuffer::new("one two")).with_clock(clock);
    manager.edit(6, 7, "").unwrap();
    manager.edit(5, 6, "").unwrap();
    manager.edit(4, 5, "").unwrap();
    assert_eq!(text(&manager), "one ");
    assert_eq!(manager.history().len(), 1);

    assert!(manager.undo());
    assert_eq!(text(&manager), "one two");
}

#[test]
fn test_paste_over_selection_is_atomic() {
    let mut manager = unbatched("<p>a</p>");
    manager.edit(3, 4, "hello world").unwrap();
    assert_eq!(text(&manager), "<p>hello world</p>");

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>a</p>");
    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>hello world</p>");
}

#[test]
fn test_unicode_offsets() {
    let mut manager = unbatched("<p>héllo</p>");
    manager.edit(8, 8, " wörld").unwrap();
    assert_eq!(text(&manager), "<p>héllo wörld</p>");

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>héllo</p>");
    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>héllo wörld</p>");
}

#[test]
fn test_new_edit_discards_redo() {
    let mut manager = unbatched("");
    manager.edit(0, 0, "one").unwrap();
    manager.edit(3, 3, " two").unwrap();

    assert!(manager.undo());
    assert_eq!(text(&manager), "one");
    assert!(manager.can_redo());

    manager.edit(3, 3, "!").unwrap();
    assert!(!manager.can_redo());
    assert!(!manager.redo());
    assert_eq!(text(&manager), "one!");

    assert!(manager.undo());
    assert_eq!(text(&manager), "one");
}

#[test]
fn test_edit_right_after_undo_is_not_folded() {
    let (clock, _) = manual_clock();
    let mut manager = HistoryManager::new(MarkupBuffer::new("")).with_clock(clock);
    type_chars(&mut manager, 0, "ab");
    assert!(manager.undo());
    assert!(manager.redo());
    manager.edit(2, 2, "c").unwrap();

    assert_eq!(manager.history().len(), 2);
    assert!(manager.undo());
    assert_eq!(text(&manager), "ab");
}

#[test]
fn test_typed_then_deleted_character_cancels_out() {
    let mut manager = unbatched("x");
    manager.edit(1, 1, "a").unwrap();
    manager.edit(1, 2, "").unwrap();
    assert!(manager.can_undo());

    assert!(!manager.undo());
    assert_eq!(text(&manager), "x");
    assert!(!manager.can_undo());
}

#[test]
fn test_max_history_size_caps_undo() {
    let mut manager = unbatched("");
    manager.set_max_history_size(Some(2));
    manager.edit(0, 0, "a").unwrap();
    manager.edit(1, 1, " b").unwrap();
    manager.edit(3, 3, " c").unwrap();
    assert_eq!(manager.history().len(), 2);

    assert!(manager.undo());
    assert_eq!(text(&manager), "a b");
    assert!(manager.undo());
    assert_eq!(text(&manager), "a");
    assert!(!manager.undo());
    assert_eq!(text(&manager), "a");
}

#[test]
fn test_max_history_size_from_config() {
    let config = HistoryConfig::from_json(r#"{"batch_window_ms": 0, "max_history_size": 1}"#)
        .unwrap();
    let mut manager = HistoryManager::with_config(MarkupBuffer::new(""), config);
    manager.edit(0, 0, "a").unwrap();
    manager.edit(1, 1, " b").unwrap();
    assert_eq!(manager.history().len(), 1);
    assert_eq!(manager.state().undo_depth, 1);
}

#[test]
fn test_clear_history() {
    let mut manager = unbatched("");
    manager.edit(0, 0, "a").unwrap();
    manager.edit(1, 1, " b").unwrap();
    assert!(manager.undo());

    manager.clear_history();
    assert!(!manager.can_undo());
    assert!(!manager.can_redo());
    assert_eq!(text(&manager), "a");
}

#[test]
fn test_undo_floor_protects_prefix() {
    let mut manager = unbatched("intro ");
    manager.set_undo_floor(3);
    manager.edit(0, 0, "ab").unwrap();

    assert!(!manager.undo());
    assert_eq!(text(&manager), "abintro ");
    assert!(manager.can_undo());

    manager.set_undo_floor(0);
    assert!(manager.undo());
    assert_eq!(text(&manager), "intro ");
}

#[test]
fn test_seeded_markup_document_is_a_boundary() {
    let mut manager = unbatched("");
    manager.seed_document("<p>a</p>").unwrap();
    assert!(manager.history().records()[0].reconciled);
    manager.edit(8, 8, "b").unwrap();

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>a</p>");
    assert!(manager.undo());
    assert_eq!(text(&manager), "");
}

#[test]
fn test_seeded_plain_document_merges_with_typing() {
    let mut manager = unbatched("");
    manager.seed_document("ab").unwrap();
    assert_eq!(manager.history().len(), 1);
    assert!(!manager.history().records()[0].reconciled);
    manager.edit(2, 2, "c").unwrap();

    assert!(manager.undo());
    assert_eq!(text(&manager), "");
}

#[test]
fn test_transient_formatting_cleared_on_replay() {
    let mut manager = unbatched("<p>teh</p>");
    manager.widget_mut().add_transient_marker(3..6);
    manager.edit(6, 6, " cat").unwrap();
    assert_eq!(manager.widget().transient_markers(), &[3..6]);

    assert!(manager.undo());
    assert!(manager.widget().transient_markers().is_empty());

    manager.widget_mut().add_transient_marker(0..3);
    assert!(manager.redo());
    assert!(manager.widget().transient_markers().is_empty());
}

#[test]
fn test_external_edit_aborts_undo() {
    let mut manager = unbatched("");
    manager.edit(0, 0, "hello").unwrap();
    manager
        .widget_mut()
        .replace_range(0, 5, "HELLO", &mut ())
        .unwrap();

    assert_eq!(
        manager.try_undo(),
        Err(ApplyError::ContentMismatch { start: 0 })
    );
    assert!(!manager.undo());
    assert_eq!(text(&manager), "HELLO");
    assert!(manager.can_undo());

    manager
        .widget_mut()
        .replace_range(0, 5, "", &mut ())
        .unwrap();
    assert_eq!(
        manager.try_undo(),
        Err(ApplyError::OutOfRange {
            start: 0,
            end: 5,
            len: 0
        })
    );
    assert_eq!(manager.history().len(), 1);
}

#[test]
fn test_forwarded_notifications_are_recorded() {
    let mut manager = HistoryManager::new(MarkupBuffer::new("<b></b>"));
    let before = text(&manager);
    manager.on_before_change(&before, 3, 0);
    manager
        .widget_mut()
        .replace_range(3, 3, "bold", &mut ())
        .unwrap();
    let after = text(&manager);
    manager.on_after_change(&after, 3, 4);

    assert!(manager.can_undo());
    assert!(manager.undo());
    assert_eq!(text(&manager), "<b></b>");
}

#[test]
fn test_record_external_change() {
    let mut manager = unbatched("<p>hi</p>");
    manager
        .widget_mut()
        .replace_range(3, 5, "yo", &mut ())
        .unwrap();
    manager.record_external(3, "hi", "yo").unwrap();
    assert_eq!(manager.history().len(), 1);

    assert!(manager.undo());
    assert_eq!(text(&manager), "<p>hi</p>");
    assert!(manager.redo());
    assert_eq!(text(&manager), "<p>yo</p>");

    assert_eq!(
        manager.record_external(0, "", "zz"),
        Err(ApplyError::ContentMismatch { start: 0 })
    );
    assert_eq!(manager.history().len(), 1);
    assert!(!manager.can_redo());
}

#[test]
fn test_subscribers_see_every_change() {
    let mut manager = unbatched("");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.subscribe(move |change| sink.lock().unwrap().push((change.kind, change.state)));

    manager.edit(0, 0, "a").unwrap();
    manager.edit(1, 1, "").unwrap();
    assert!(manager.undo());
    assert!(manager.redo());
    manager.clear_history();

    let seen = seen.lock().unwrap();
    let kinds: Vec<_> = seen.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        kinds,
        vec![
            HistoryChangeKind::Recorded,
            HistoryChangeKind::Undone,
            HistoryChangeKind::Redone,
            HistoryChangeKind::Cleared,
        ]
    );
    let versions: Vec<_> = seen.iter().map(|(_, state)| state.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 4]);
    assert!(seen[1].1.can_redo);
    assert_eq!(manager.state().version, 4);
}

#[test]
fn test_into_widget_detaches() {
    let mut manager = unbatched("");
    manager.edit(0, 0, "kept").unwrap();
    let widget = manager.into_widget();
    assert_eq!(widget.text(), "kept");
}
