use super::Timeline;
use crate::domain::models::Message;
use crate::domain::models::Role;

fn streaming_count(timeline: &Timeline) -> usize {
    return timeline
        .messages()
        .iter()
        .filter(|msg| return msg.streaming)
        .count();
}

#[test]
fn it_appends_user_and_placeholder_in_order() {
    let mut timeline = Timeline::default();
    let user_id = timeline.push_user("Hello");
    let assistant_id = timeline.push_placeholder();

    assert_eq!(timeline.len(), 2);
    assert_ne!(user_id, assistant_id);
    assert_eq!(timeline.messages()[0].role, Role::User);
    assert_eq!(timeline.messages()[0].content, "Hello".to_string());
    assert!(!timeline.messages()[0].streaming);
    assert_eq!(timeline.messages()[1].role, Role::Assistant);
    assert!(timeline.messages()[1].streaming);
}

#[test]
fn it_concatenates_fragments_in_arrival_order() {
    let mut timeline = Timeline::default();
    timeline.push_user("Hello");
    let id = timeline.push_placeholder();

    let fragments = vec!["Hi", " there", ", how", " can I help?"];
    for fragment in &fragments {
        timeline.append_streaming(id, fragment);
    }

    assert_eq!(timeline.messages()[1].content, fragments.concat());
}

#[test]
fn it_holds_at_most_one_streaming_message() {
    let mut timeline = Timeline::default();
    timeline.push_user("first");
    let first = timeline.push_placeholder();
    assert_eq!(streaming_count(&timeline), 1);

    timeline.finalize(first);
    assert_eq!(streaming_count(&timeline), 0);

    timeline.push_user("second");
    timeline.push_placeholder();
    assert_eq!(streaming_count(&timeline), 1);
}

#[test]
fn it_stops_appending_after_finalize() {
    let mut timeline = Timeline::default();
    let id = timeline.push_placeholder();
    timeline.append_streaming(id, "done");
    timeline.finalize(id);

    timeline.append_streaming(id, " and more");
    assert_eq!(timeline.messages()[0].content, "done".to_string());
}

#[test]
fn it_discards_placeholders() {
    let mut timeline = Timeline::default();
    timeline.push_user("Hello");
    let id = timeline.push_placeholder();
    timeline.append_streaming(id, "partial out");

    timeline.discard(id);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.messages()[0].role, Role::User);
}

#[test]
fn it_ignores_operations_on_unknown_ids() {
    let mut timeline = Timeline::default();
    timeline.push_user("Hello");

    timeline.append_streaming(999, "ghost");
    timeline.finalize(999);
    timeline.discard(999);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.messages()[0].content, "Hello".to_string());
}

#[test]
fn it_reseeds_local_ids_above_server_history() {
    let mut timeline = Timeline::default();
    timeline.load(vec![
        Message::new(17, Role::User, "older question"),
        Message::new(18, Role::Assistant, "older answer"),
    ]);

    let id = timeline.push_user("new question");
    assert!(id > 18);
    assert_eq!(timeline.len(), 3);
}

#[test]
fn it_clears_without_resetting_ids() {
    let mut timeline = Timeline::default();
    let first = timeline.push_user("one");
    timeline.clear();
    assert!(timeline.is_empty());

    let second = timeline.push_user("two");
    assert_ne!(first, second);
}
