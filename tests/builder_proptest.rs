//! Property-based tests for the stack-based tree builder
//!
//! Any well-formed event sequence must build into a tree holding exactly
//! one node per matched start/end pair, and any sequence missing an end tag
//! must be rejected with a structural violation, never a tree.

use proptest::prelude::*;

use mvnx::mvnx::event::Event;
use mvnx::mvnx::tree::build;

#[derive(Debug, Clone)]
struct Elem {
    name: String,
    children: Vec<Elem>,
}

fn elem_strategy() -> impl Strategy<Value = Elem> {
    let leaf = "[a-e]{1,3}".prop_map(|name| Elem { name, children: Vec::new() });
    leaf.prop_recursive(4, 24, 4, |inner| {
        ("[a-e]{1,3}", prop::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| Elem { name, children })
    })
}

/// Append the start/end events for `elem` and return how many elements were
/// emitted.
fn push_events(elem: &Elem, events: &mut Vec<Event>) -> usize {
    events.push(Event::start(&elem.name, &[]));
    let mut count = 1;
    for child in &elem.children {
        count += push_events(child, events);
    }
    events.push(Event::end(&elem.name));
    count
}

/// Like `push_events`, but renames every element to a distinct `e<n>`.
fn push_unique_events(elem: &Elem, next: &mut usize, events: &mut Vec<Event>) {
    let name = format!("e{}", *next);
    *next += 1;
    events.push(Event::start(&name, &[]));
    for child in &elem.children {
        push_unique_events(child, next, events);
    }
    events.push(Event::end(&name));
}

proptest! {
    #[test]
    fn test_built_tree_holds_every_matched_pair(root in elem_strategy()) {
        let mut events = vec![Event::StartDocument];
        let n = push_events(&root, &mut events);
        events.push(Event::EndDocument);

        let tree = build(events).unwrap();
        prop_assert_eq!(tree.node_count(), n);
    }

    #[test]
    fn test_sequence_missing_an_end_tag_never_builds(root in elem_strategy()) {
        prop_assume!(!root.children.is_empty());

        // Unique names, so the dangling element can never be closed by a
        // later end tag that happens to share its name.
        let mut events = vec![Event::StartDocument];
        let mut next = 0;
        push_unique_events(&root, &mut next, &mut events);
        // Drop the first end tag: one element now never closes, so the
        // builder must fail on a mismatched end or on unclosed elements at
        // the end of the document.
        let first_end = events
            .iter()
            .position(|e| matches!(e, Event::EndElement(_)))
            .unwrap();
        events.remove(first_end);
        events.push(Event::EndDocument);

        prop_assert!(build(events).is_err());
    }

    #[test]
    fn test_allow_list_never_desynchronizes(root in elem_strategy()) {
        // Filter to a single name: whatever the document shape, the builder
        // either produces a tree of only that name or fails structurally;
        // it must never panic or leave other elements in the tree.
        let mut events = vec![Event::StartDocument];
        push_events(&root, &mut events);
        events.push(Event::EndDocument);

        if let Ok(tree) = mvnx::mvnx::tree::build_with_allow_list(events, ["a"]) {
            let mut pending = vec![tree.root()];
            while let Some(id) = pending.pop() {
                prop_assert_eq!(tree.node(id).name(), "a");
                if let Some(buckets) = tree.node(id).buckets() {
                    for (_, ids) in buckets.iter() {
                        pending.extend(ids.iter().copied());
                    }
                }
            }
        }
    }
}
