//! Pure state transition function

use super::{ConvState, Effect, Event};
use crate::message::{CorrelationToken, MessageId, Role};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition.
///
/// None of these change state; the store treats them as no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A message is already being sent")]
    DispatchInFlight,
    #[error("Outcome for {token} does not match any in-flight dispatch")]
    StaleOutcome { token: CorrelationToken },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(state: &ConvState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Any state + Reset -> Idle, log and error cleared
        (_, Event::Reset) => Ok(TransitionResult::new(ConvState::Idle)
            .with_effect(Effect::ClearLog)
            .with_effect(Effect::ClearError)),

        // Idle + UserSubmit -> Dispatching
        (ConvState::Idle, Event::UserSubmit { message }) => {
            let token = match message.id() {
                MessageId::Local(token) if message.role() == Role::User => *token,
                other => {
                    return Err(TransitionError::InvalidTransition(format!(
                        "submitted message must be a local user message, got {other} ({})",
                        message.role().as_str()
                    )))
                }
            };

            let prompt = message.text();
            if prompt.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            Ok(TransitionResult::new(ConvState::Dispatching { token })
                .with_effect(Effect::ClearError)
                .with_effect(Effect::AppendMessage(message))
                .with_effect(Effect::RequestDispatch { prompt, token }))
        }

        // Dispatching + UserSubmit -> reject, one dispatch at a time
        (ConvState::Dispatching { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::DispatchInFlight)
        }

        // Dispatching + matching success -> Idle with reply appended.
        // The provisional user message stays and is thereby confirmed.
        (ConvState::Dispatching { token }, Event::DispatchSucceeded { reply, token: outcome })
            if *token == outcome =>
        {
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::confirm_provisional(outcome))
                .with_effect(Effect::AppendMessage(reply))
                .with_effect(Effect::ClearError))
        }

        // Dispatching + matching failure -> Idle with rollback and error
        (ConvState::Dispatching { token }, Event::DispatchFailed { error, token: outcome })
            if *token == outcome =>
        {
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::remove_provisional(outcome))
                .with_effect(Effect::dispatch_failed(&error.message)))
        }

        // Outcomes for anything but the in-flight token (late results after a reset)
        (_, Event::DispatchSucceeded { token, .. } | Event::DispatchFailed { token, .. }) => {
            Err(TransitionError::StaleOutcome { token })
        }
    }
}
