//! Session runtime executor

use super::{Command, SseEvent};
use crate::dispatch::{DispatchOutcome, DispatchRequest, Dispatcher};
use crate::state_machine::{Effect, TransitionError};
use crate::store::{ConversationStore, Submission};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Owns the store; the only code that mutates it
pub struct SessionRuntime {
    store: ConversationStore,
    dispatcher: Arc<Dispatcher>,
    command_rx: mpsc::Receiver<Command>,
    outcome_tx: mpsc::Sender<DispatchOutcome>,
    outcome_rx: mpsc::Receiver<DispatchOutcome>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl SessionRuntime {
    pub fn new(
        store: ConversationStore,
        dispatcher: Arc<Dispatcher>,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        Self {
            store,
            dispatcher,
            command_rx,
            outcome_tx,
            outcome_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(persona = %self.store.persona().name, "Starting session runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.process_command(command),
                    None => break,
                },
                Some(outcome) = self.outcome_rx.recv() => {
                    self.process_outcome(outcome);
                }
            }
        }

        tracing::info!("Session runtime stopped");
    }

    fn process_command(&mut self, command: Command) {
        match command {
            Command::Submit { text, reply } => {
                let accepted = match self.store.submit_user_text(&text) {
                    Some(Submission { effects, request }) => {
                        self.execute_effects(effects);
                        self.spawn_dispatch(request);
                        true
                    }
                    None => false,
                };
                let _ = reply.send(accepted);
            }
            Command::Reset { reply } => {
                let effects = self.store.reset();
                tracing::info!("Conversation reset");
                self.execute_effects(effects);
                let _ = reply.send(());
            }
            Command::SelectPersona { persona, reply } => {
                tracing::info!(persona = %persona.name, "Persona selected");
                let effects = self.store.set_persona(persona);
                self.execute_effects(effects);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.store.snapshot());
            }
            Command::Attach { reply } => {
                // Broadcasts only leave this task, so nothing can slip between the two
                let rx = self.broadcast_tx.subscribe();
                let _ = reply.send((self.store.snapshot(), rx));
            }
        }
    }

    fn process_outcome(&mut self, outcome: DispatchOutcome) {
        let token = outcome.token();
        let success = outcome.is_success();

        match self.store.on_outcome(outcome) {
            Ok(effects) => {
                tracing::info!(%token, success, "Dispatch cycle finished");
                self.execute_effects(effects);
            }
            Err(TransitionError::StaleOutcome { .. }) => {
                tracing::info!(%token, success, "Discarding outcome for abandoned dispatch");
            }
            Err(e) => {
                tracing::warn!(%token, error = %e, "Unexpected dispatch outcome");
            }
        }
    }

    /// Notify clients about applied effects
    fn execute_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ClearLog => self.notify(SseEvent::Reset {
                    persona: self.store.persona().clone(),
                }),
                Effect::AppendMessage(message) => {
                    let message = self.store.view(&message);
                    self.notify(SseEvent::Message { message });
                }
                Effect::RemoveMessage { id } => self.notify(SseEvent::MessageRemoved { id }),
                Effect::ConfirmMessage { id } => self.notify(SseEvent::MessageConfirmed { id }),
                Effect::RecordError { message } => self.notify(SseEvent::Error { message }),
                // The submission carries the request; it is spawned by the caller
                Effect::ClearError | Effect::RequestDispatch { .. } => {}
            }
        }

        self.notify(SseEvent::StateChange {
            state: self.store.state().name(),
            in_flight: self.store.in_flight(),
            last_error: self.store.last_error().map(str::to_owned),
        });
    }

    fn spawn_dispatch(&self, request: DispatchRequest) {
        let dispatcher = self.dispatcher.clone();
        let outcome_tx = self.outcome_tx.clone();

        tracing::info!(
            token = %request.token,
            history_len = request.history.len(),
            "Dispatching message (background)"
        );

        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(&request).await;
            if outcome_tx.send(outcome).await.is_err() {
                tracing::warn!(token = %request.token, "Session runtime gone, dropping outcome");
            }
        });
    }

    fn notify(&self, event: SseEvent) {
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }
}
