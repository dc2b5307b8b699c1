use super::*;

#[test]
fn new_history_is_empty() {
    let history = History::new();

    assert!(history.is_empty());
    assert_eq!(history.recent(10), &[]);
}

#[test]
fn append_always_succeeds_and_preserves_order() {
    let mut history = History::new();
    history.append("first question", "first answer");
    history.append("second question", "second answer");

    assert_eq!(history.len(), 2);
    let window = history.recent(10);
    assert_eq!(window[0].question, "first question");
    assert_eq!(window[1].question, "second question");
}

#[test]
fn window_returns_most_recent_turns_oldest_first() {
    let mut history = History::new();
    for i in 0..15 {
        history.append(format!("q{}", i), format!("a{}", i));
    }

    let window = history.recent(10);

    assert_eq!(window.len(), 10);
    for (i, turn) in window.iter().enumerate() {
        assert_eq!(turn.question, format!("q{}", i + 5));
        assert_eq!(turn.answer, format!("a{}", i + 5));
    }
}

#[test]
fn window_smaller_history_returns_everything() {
    let mut history = History::new();
    history.append("only", "turn");

    assert_eq!(history.recent(10).len(), 1);
}

#[test]
fn older_turns_are_retained_not_evicted() {
    let mut history = History::new();
    for i in 0..25 {
        history.append(format!("q{}", i), format!("a{}", i));
    }

    // Turns outside the window remain stored.
    assert_eq!(history.len(), 25);
    assert_eq!(history.recent(25)[0].question, "q0");
}

#[test]
fn zero_window_is_empty() {
    let mut history = History::new();
    history.append("q", "a");

    assert!(history.recent(0).is_empty());
}
