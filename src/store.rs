//! Conversation store
//!
//! Owns the conversation log and pending/error state. Every mutation goes
//! through the pure `transition` function; the store only applies the
//! effects it returns.

#[cfg(test)]
mod proptests;

use crate::dispatch::{DispatchError, DispatchOutcome, DispatchRequest};
use crate::message::{CorrelationToken, Message};
use crate::persona::Persona;
use crate::state_machine::{transition, ConvState, Effect, Event, TransitionError};
use serde::Serialize;
use uuid::Uuid;

/// In-memory conversation with one persona
#[derive(Debug)]
pub struct ConversationStore {
    persona: Persona,
    state: ConvState,
    log: Vec<Message>,
    last_error: Option<String>,
}

impl ConversationStore {
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            state: ConvState::Idle,
            log: Vec::new(),
            last_error: None,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Switch persona. Starts a fresh conversation.
    pub fn set_persona(&mut self, persona: Persona) -> Vec<Effect> {
        self.persona = persona;
        self.reset()
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn state(&self) -> ConvState {
        self.state
    }

    pub fn in_flight(&self) -> bool {
        self.state.is_dispatching()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether `message` is the optimistic entry of the in-flight dispatch
    pub fn is_provisional(&self, message: &Message) -> bool {
        self.state
            .in_flight()
            .is_some_and(|token| message.is_local(token))
    }

    /// The log without the provisional message, if one exists
    pub fn confirmed_history(&self) -> Vec<Message> {
        self.log
            .iter()
            .filter(|m| !self.is_provisional(m))
            .cloned()
            .collect()
    }

    /// Run one event through the state machine and apply its effects.
    ///
    /// Returns the applied effects; `RequestDispatch` is left for the caller
    /// to execute (see `dispatch_request`).
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let result = transition(&self.state, event)?;

        if self.state != result.new_state {
            tracing::debug!(
                from = self.state.name(),
                to = result.new_state.name(),
                "Conversation state change"
            );
        }
        self.state = result.new_state;

        for effect in &result.effects {
            self.apply(effect);
        }
        Ok(result.effects)
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::ClearLog => self.log.clear(),
            Effect::AppendMessage(message) => self.log.push(message.clone()),
            Effect::RemoveMessage { id } => self.log.retain(|m| m.id() != id),
            // Provisional status is derived from the state, nothing to store
            Effect::ConfirmMessage { .. } => {}
            Effect::RecordError { message } => self.last_error = Some(message.clone()),
            Effect::ClearError => self.last_error = None,
            Effect::RequestDispatch { .. } => {}
        }
    }

    /// Build the outbound request for a `RequestDispatch` effect
    pub fn dispatch_request(&self, prompt: String, token: CorrelationToken) -> DispatchRequest {
        DispatchRequest {
            persona: self.persona.name.clone(),
            history: self.confirmed_history(),
            prompt,
            token,
        }
    }

    /// Clear log, error and in-flight state unconditionally
    pub fn reset(&mut self) -> Vec<Effect> {
        // Reset is accepted from every state
        self.handle(Event::Reset).unwrap_or_default()
    }

    /// Optimistically append a user message and return the request to send
    /// along with the applied effects.
    ///
    /// Returns `None` (and changes nothing) for blank text or while another
    /// dispatch is in flight.
    pub fn submit_user_text(&mut self, text: &str) -> Option<Submission> {
        let token = Uuid::new_v4();
        let event = Event::UserSubmit {
            message: Message::user(token, text),
        };

        let effects = match self.handle(event) {
            Ok(effects) => effects,
            Err(e) => {
                tracing::debug!(reason = %e, "Submission ignored");
                return None;
            }
        };

        let request = effects.iter().find_map(|effect| match effect {
            Effect::RequestDispatch { prompt, token } => {
                Some(self.dispatch_request(prompt.clone(), *token))
            }
            _ => None,
        })?;
        Some(Submission { effects, request })
    }

    pub fn on_dispatch_success(
        &mut self,
        reply: Message,
        token: CorrelationToken,
    ) -> Result<Vec<Effect>, TransitionError> {
        self.handle(Event::DispatchSucceeded { reply, token })
    }

    pub fn on_dispatch_failure(
        &mut self,
        error: DispatchError,
        token: CorrelationToken,
    ) -> Result<Vec<Effect>, TransitionError> {
        self.handle(Event::DispatchFailed { error, token })
    }

    /// Feed a dispatcher outcome into the matching handler
    pub fn on_outcome(&mut self, outcome: DispatchOutcome) -> Result<Vec<Effect>, TransitionError> {
        match outcome {
            DispatchOutcome::Success { reply, token } => self.on_dispatch_success(reply, token),
            DispatchOutcome::Failure { error, token } => self.on_dispatch_failure(error, token),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            persona: self.persona.clone(),
            messages: self.messages().iter().map(|m| self.view(m)).collect(),
            in_flight: self.in_flight(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn view(&self, message: &Message) -> MessageView {
        MessageView {
            message: message.clone(),
            provisional: self.is_provisional(message),
        }
    }
}

/// An accepted submission: the effects already applied to the log, and the
/// outbound request the caller must hand to the dispatcher
#[derive(Debug)]
pub struct Submission {
    pub effects: Vec<Effect>,
    pub request: DispatchRequest,
}

/// Read-only copy of the store for rendering
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub persona: Persona,
    pub messages: Vec<MessageView>,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

/// A message plus whether it still awaits confirmation
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub provisional: bool,
}
