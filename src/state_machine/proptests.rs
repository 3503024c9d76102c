//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::dispatch::DispatchError;
use crate::message::{CorrelationToken, Message, MessageId, Part};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_token() -> impl Strategy<Value = CorrelationToken> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        arb_token().prop_map(|token| ConvState::Dispatching { token }),
    ]
}

fn arb_error() -> impl Strategy<Value = DispatchError> {
    (
        prop_oneof![
            Just(DispatchError::network("")),
            (400u16..600).prop_map(|code| DispatchError::status(code, "")),
            Just(DispatchError::malformed("")),
        ],
        "[a-zA-Z0-9 ]{1,30}",
    )
        .prop_map(|(mut error, message)| {
            error.message = message;
            error
        })
}

fn arb_submit() -> impl Strategy<Value = Event> {
    (arb_token(), "[a-zA-Z가-힣 \t]{0,20}").prop_map(|(token, text)| Event::UserSubmit {
        message: Message::user(token, text),
    })
}

fn arb_reply() -> impl Strategy<Value = Message> {
    (any::<u64>(), "[a-zA-Z ]{1,20}")
        .prop_map(|(n, text)| Message::model(MessageId::Sequence(n), vec![Part::text(text)]))
}

fn arb_event_for(state: ConvState) -> impl Strategy<Value = Event> {
    // Outcomes are biased toward the in-flight token so matching paths get exercised
    let token = state.in_flight().map_or_else(|| arb_token().boxed(), |t| {
        prop_oneof![3 => Just(t), 1 => arb_token()].boxed()
    });
    prop_oneof![
        3 => arb_submit(),
        1 => Just(Event::Reset),
        2 => (arb_reply(), token.clone())
            .prop_map(|(reply, token)| Event::DispatchSucceeded { reply, token }),
        2 => (arb_error(), token).prop_map(|(error, token)| Event::DispatchFailed { error, token }),
    ]
}

fn arb_state_and_event() -> impl Strategy<Value = (ConvState, Event)> {
    arb_state().prop_flat_map(|state| (Just(state), arb_event_for(state)))
}

// ============================================================================
// Invariant helpers
// ============================================================================

fn dispatch_effects(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::RequestDispatch { .. }))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // A dispatch is requested exactly when the machine enters Dispatching,
    // and it carries the new state's token
    #[test]
    fn prop_dispatch_iff_entering_dispatching((state, event) in arb_state_and_event()) {
        if let Ok(result) = transition(&state, event) {
            match result.new_state {
                ConvState::Dispatching { token } => {
                    prop_assert!(!state.is_dispatching());
                    prop_assert_eq!(dispatch_effects(&result.effects), 1);
                    let carries_token = result.effects.iter().any(|e| matches!(
                        e,
                        Effect::RequestDispatch { token: t, .. } if *t == token
                    ));
                    prop_assert!(carries_token);
                }
                ConvState::Idle => prop_assert_eq!(dispatch_effects(&result.effects), 0),
            }
        }
    }

    // Reset is accepted from every state and always lands in Idle
    #[test]
    fn prop_reset_always_idle(state in arb_state()) {
        let result = transition(&state, Event::Reset).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert!(result.effects.contains(&Effect::ClearLog));
        prop_assert!(result.effects.contains(&Effect::ClearError));
    }

    // Submissions are rejected while a dispatch is in flight
    #[test]
    fn prop_busy_rejects_submit(token in arb_token(), event in arb_submit()) {
        let result = transition(&ConvState::Dispatching { token }, event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::DispatchInFlight);
    }

    // Blank text never starts a dispatch
    #[test]
    fn prop_blank_submit_rejected(token in arb_token(), text in "[ \t\n]{0,10}") {
        let event = Event::UserSubmit { message: Message::user(token, text) };
        prop_assert_eq!(transition(&ConvState::Idle, event).unwrap_err(), TransitionError::EmptyInput);
    }

    // Outcomes only apply to the token they were issued for
    #[test]
    fn prop_foreign_outcome_is_stale(
        state in arb_state(),
        token in arb_token(),
        reply in arb_reply(),
        error in arb_error(),
        success in any::<bool>(),
    ) {
        prop_assume!(state.in_flight() != Some(token));
        let event = if success {
            Event::DispatchSucceeded { reply, token }
        } else {
            Event::DispatchFailed { error, token }
        };
        prop_assert_eq!(transition(&state, event).unwrap_err(), TransitionError::StaleOutcome { token });
    }

    // A failure removes exactly the provisional message it was issued for
    #[test]
    fn prop_failure_removes_own_message(token in arb_token(), error in arb_error()) {
        let result = transition(
            &ConvState::Dispatching { token },
            Event::DispatchFailed { error: error.clone(), token },
        ).unwrap();

        prop_assert_eq!(result.new_state, ConvState::Idle);
        let removed: Vec<&MessageId> = result.effects.iter().filter_map(|e| match e {
            Effect::RemoveMessage { id } => Some(id),
            _ => None,
        }).collect();
        let expected = MessageId::Local(token);
        prop_assert_eq!(removed, vec![&expected]);
        let recorded = result.effects.iter().any(|e| matches!(
            e,
            Effect::RecordError { message } if message.contains(&error.message)
        ));
        prop_assert!(recorded);
    }

    // A success confirms exactly the provisional message it was issued for
    #[test]
    fn prop_success_confirms_own_message(token in arb_token(), reply in arb_reply()) {
        let result = transition(
            &ConvState::Dispatching { token },
            Event::DispatchSucceeded { reply, token },
        ).unwrap();

        let confirmed: Vec<&MessageId> = result.effects.iter().filter_map(|e| match e {
            Effect::ConfirmMessage { id } => Some(id),
            _ => None,
        }).collect();
        let expected = MessageId::Local(token);
        prop_assert_eq!(confirmed, vec![&expected]);
        let removes = result.effects.iter().any(|e| matches!(e, Effect::RemoveMessage { .. }));
        prop_assert!(!removes);
    }

    // Every cycle ends in Idle: submit then outcome for the same token
    #[test]
    fn prop_cycle_returns_to_idle(submit in arb_submit(), reply in arb_reply(), error in arb_error(), success in any::<bool>()) {
        let Ok(started) = transition(&ConvState::Idle, submit) else {
            return Ok(());
        };
        let ConvState::Dispatching { token } = started.new_state else {
            return Err(TestCaseError::fail("submit did not start a dispatch"));
        };
        let outcome = if success {
            Event::DispatchSucceeded { reply, token }
        } else {
            Event::DispatchFailed { error, token }
        };
        let finished = transition(&started.new_state, outcome).unwrap();
        prop_assert_eq!(finished.new_state, ConvState::Idle);
    }
}
