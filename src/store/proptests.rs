//! Property-based tests for the conversation store
//!
//! Drives the store with random operation sequences and checks the log
//! bookkeeping after every step.

use super::*;
use crate::message::{MessageId, Part};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Succeed(String),
    Fail(String),
    StaleOutcome,
    Reset,
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z가-힣 ?!]{1,30}",
        1 => "[ \t\n]{0,5}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_text().prop_map(Op::Submit),
        3 => "[a-zA-Z가-힣 ]{1,30}".prop_map(Op::Succeed),
        2 => "[a-zA-Z0-9 ]{1,30}".prop_map(Op::Fail),
        1 => Just(Op::StaleOutcome),
        1 => Just(Op::Reset),
    ]
}

fn ids(messages: &[Message]) -> Vec<MessageId> {
    messages.iter().map(|m| m.id().clone()).collect()
}

fn provisional_count(store: &ConversationStore) -> usize {
    store
        .messages()
        .iter()
        .filter(|m| store.is_provisional(m))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_log_bookkeeping(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut store = ConversationStore::new(Persona::counselor());
        // Log length before the in-flight submission, and its token
        let mut pending: Option<(usize, CorrelationToken)> = None;
        let mut seq = 0u64;

        for op in ops {
            let before = store.messages().len();
            let was_in_flight = store.in_flight();

            match op {
                Op::Submit(text) => {
                    let confirmed_before = ids(store.messages());
                    let result = store.submit_user_text(&text);

                    if text.trim().is_empty() || was_in_flight {
                        prop_assert!(result.is_none());
                        prop_assert_eq!(store.messages().len(), before);
                        prop_assert_eq!(store.in_flight(), was_in_flight);
                    } else {
                        let request = result.unwrap().request;
                        prop_assert_eq!(store.messages().len(), before + 1);
                        prop_assert!(store.in_flight());
                        prop_assert_eq!(ids(&request.history), confirmed_before);
                        prop_assert_eq!(&request.prompt, &text);
                        pending = Some((before, request.token));
                    }
                }
                Op::Succeed(text) => {
                    if let Some((_, token)) = pending.take() {
                        seq += 1;
                        let reply = Message::model(MessageId::Sequence(seq), vec![Part::text(text)]);
                        store.on_dispatch_success(reply, token).unwrap();
                        prop_assert_eq!(store.messages().len(), before + 1);
                        prop_assert!(!store.in_flight());
                        prop_assert!(store.last_error().is_none());
                    }
                }
                Op::Fail(message) => {
                    if let Some((len_before_submit, token)) = pending.take() {
                        let error = DispatchError::network(message.clone());
                        store.on_dispatch_failure(error, token).unwrap();
                        prop_assert_eq!(store.messages().len(), len_before_submit);
                        prop_assert!(!store.in_flight());
                        prop_assert!(store.last_error().unwrap().contains(&message));
                    }
                }
                Op::StaleOutcome => {
                    let reply = Message::model(MessageId::Sequence(0), vec![Part::text("stale")]);
                    let result = store.on_dispatch_success(reply, Uuid::new_v4());
                    prop_assert!(result.is_err());
                    prop_assert_eq!(store.messages().len(), before);
                    prop_assert_eq!(store.in_flight(), was_in_flight);
                }
                Op::Reset => {
                    store.reset();
                    pending = None;
                    prop_assert!(store.messages().is_empty());
                    prop_assert!(!store.in_flight());
                    prop_assert!(store.last_error().is_none());
                }
            }

            prop_assert!(provisional_count(&store) <= 1);
            prop_assert_eq!(provisional_count(&store) == 1, store.in_flight());
        }
    }

    #[test]
    fn prop_successful_cycles_grow_by_two(prompts in proptest::collection::vec("[a-z가-힣]{1,10}", 1..10)) {
        let mut store = ConversationStore::new(Persona::counselor());

        for (n, prompt) in prompts.iter().enumerate() {
            let log_before = ids(store.messages());
            let request = store.submit_user_text(prompt).unwrap().request;
            prop_assert_eq!(ids(&request.history), log_before);

            let reply = Message::model(MessageId::Sequence(n as u64), vec![Part::text("ok")]);
            store.on_dispatch_success(reply, request.token).unwrap();
            prop_assert_eq!(store.messages().len(), 2 * (n + 1));
        }
    }
}
