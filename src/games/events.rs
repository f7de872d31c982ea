//! Outcome notifications
//!
//! Every emitted event is appended to an in-memory history (the equivalent
//! of a transaction receipt's logs) and broadcast to live subscribers. The
//! history keeps the most recent [`EVENT_HISTORY_CAPACITY`] events.

use crate::common::types::{Address, Amount};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;
pub const EVENT_HISTORY_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GameEvent {
    /// Result of a guess, for the caller who made it
    Log { message: String, sender: Address },
    WinnerPaid { winner: Address, amount: Amount },
    GuessRangeUpdated { previous: u64, current: u64 },
    GameReset { by: Address },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Log { .. } => "Log",
            GameEvent::WinnerPaid { .. } => "WinnerPaid",
            GameEvent::GuessRangeUpdated { .. } => "GuessRangeUpdated",
            GameEvent::GameReset { .. } => "GameReset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub event: GameEvent,
    pub emitted_at: DateTime<Utc>,
}

pub struct EventEmitter {
    history: VecDeque<EmittedEvent>,
    sender: broadcast::Sender<GameEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            history: VecDeque::new(),
            sender,
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        tracing::debug!(event = event.name(), "Emitting game event");
        if self.history.len() == EVENT_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(EmittedEvent {
            event: event.clone(),
            emitted_at: Utc::now(),
        });
        // No live subscribers is fine, the history still has it
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Retained events, oldest first
    pub fn history(&self) -> &VecDeque<EmittedEvent> {
        &self.history
    }

    pub fn last(&self) -> Option<&GameEvent> {
        self.history.back().map(|e| &e.event)
    }

    /// `(message, sender)` of every `Log` event, oldest first
    pub fn logs(&self) -> impl Iterator<Item = (&str, Address)> + '_ {
        self.history.iter().filter_map(|e| match &e.event {
            GameEvent::Log { message, sender } => Some((message.as_str(), *sender)),
            _ => None,
        })
    }

    /// Event history as a JSON array, shaped like a receipt's decoded logs
    pub fn history_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.history)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
