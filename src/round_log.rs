//! Round log: condition labelling and the in-memory record buffer that the
//! persistence side flushes.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::blocks::Vp;
use crate::controller::SessionController;
use crate::error::{TabletopError, TabletopResult};
use crate::state::StartMode;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Unmasked,
    Masked,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Unmasked => "unmasked",
            Condition::Masked => "masked",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn derive_condition(mode: StartMode) -> Condition {
    match mode {
        StartMode::C => Condition::Unmasked,
        StartMode::T => Condition::Masked,
    }
}

/// Condition for a raw mode string; anything other than `C` or `T` is an
/// error.
pub fn condition_for_mode(mode: &str) -> TabletopResult<Condition> {
    let mode: StartMode = mode.parse()?;
    Ok(derive_condition(mode))
}

// ---------------------------------------------------------------------------
// Choice formatting
// ---------------------------------------------------------------------------

pub trait ChoiceFormatter {
    fn format_signal_choice(&self, value: &str) -> String;
    fn format_decision_choice(&self, value: &str) -> String;
}

/// Records choices exactly as entered.
pub struct PlainFormatter;

impl ChoiceFormatter for PlainFormatter {
    fn format_signal_choice(&self, value: &str) -> String {
        value.to_string()
    }

    fn format_decision_choice(&self, value: &str) -> String {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What happened, as reported by the view.
#[derive(Debug, Clone)]
pub struct RoundEvent {
    pub player: String,
    pub event: String,
    pub actor: Vp,
    pub signal: Option<String>,
    pub decision: Option<String>,
    pub payload: Map<String, Value>,
}

impl RoundEvent {
    pub fn new(player: &str, event: &str, actor: Vp) -> Self {
        RoundEvent {
            player: player.to_string(),
            event: event.to_string(),
            actor,
            signal: None,
            decision: None,
            payload: Map::new(),
        }
    }

    pub fn with_signal(mut self, signal: &str) -> Self {
        self.signal = Some(signal.to_string());
        self
    }

    pub fn with_decision(mut self, decision: &str) -> Self {
        self.decision = Some(decision.to_string());
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// Keys owned by the record itself; payload entries may not reuse them.
pub const RESERVED_LOG_KEYS: &[&str] = &[
    "session_id",
    "Bedingung",
    "block_index",
    "practice",
    "round_in_block",
    "player",
    "event",
    "actor",
    "signaler",
    "judge",
    "first_player",
    "second_player",
    "signal",
    "decision",
    "timestamp",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundLogRecord {
    pub session_id: String,
    #[serde(rename = "Bedingung")]
    pub condition: Condition,
    pub block_index: u32,
    pub practice: bool,
    pub round_in_block: usize,
    pub player: String,
    pub event: String,
    pub actor: u8,
    pub signaler: u8,
    pub judge: u8,
    pub first_player: u8,
    pub second_player: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Append-only buffer of round records for one session.
#[derive(Debug, Clone, Default)]
pub struct RoundLog {
    session_id: String,
    records: Vec<RoundLogRecord>,
}

impl RoundLog {
    pub fn new(session_id: &str) -> Self {
        RoundLog {
            session_id: session_id.to_string(),
            records: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Label the event with the session condition and the current round
    /// context, and append it to the buffer. No I/O happens here.
    pub fn write_round_log(
        &mut self,
        controller: &SessionController,
        event: RoundEvent,
        formatter: &dyn ChoiceFormatter,
    ) -> TabletopResult<&RoundLogRecord> {
        if let Some(key) = event.payload.keys().find(|k| RESERVED_LOG_KEYS.contains(&k.as_str())) {
            return Err(TabletopError::InvalidValue(format!(
                "payload key {:?} collides with a round log field",
                key
            )));
        }
        let state = controller.state();
        let (block, _) = controller.get_current_plan()?;
        let roles = state.roles();

        let record = RoundLogRecord {
            session_id: self.session_id.clone(),
            condition: derive_condition(state.start_mode()),
            block_index: block.index,
            practice: block.practice,
            round_in_block: state.round_in_block(),
            player: event.player,
            event: event.event,
            actor: event.actor.number(),
            signaler: roles.signaler.number(),
            judge: roles.judge.number(),
            first_player: roles.first_player.number(),
            second_player: roles.second_player.number(),
            signal: event.signal.as_deref().map(|s| formatter.format_signal_choice(s)),
            decision: event.decision.as_deref().map(|d| formatter.format_decision_choice(d)),
            timestamp: Utc::now(),
            payload: event.payload,
        };
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn records(&self) -> &[RoundLogRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&RoundLogRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand the buffered records to the persistence side.
    pub fn drain(&mut self) -> Vec<RoundLogRecord> {
        std::mem::take(&mut self.records)
    }
}

/// Write records as JSON lines. Returns the number of records written.
pub fn persist_jsonl(records: &[RoundLogRecord], writer: &mut dyn Write) -> TabletopResult<usize> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_labels() {
        assert_eq!(derive_condition(StartMode::C), Condition::Unmasked);
        assert_eq!(derive_condition(StartMode::T), Condition::Masked);
        assert_eq!(Condition::Unmasked.to_string(), "unmasked");
        assert_eq!(Condition::Masked.to_string(), "masked");
    }

    #[test]
    fn test_condition_for_unknown_mode() {
        assert!(matches!(
            condition_for_mode("M"),
            Err(TabletopError::UnknownStartMode(_))
        ));
    }

    #[test]
    fn test_round_event_builder() {
        let event = RoundEvent::new("P2", "decision", Vp::Vp2)
            .with_decision("call")
            .with_field("latency_ms", 420);
        assert_eq!(event.decision.as_deref(), Some("call"));
        assert!(event.signal.is_none());
        assert_eq!(event.payload["latency_ms"], Value::from(420));
    }
}
