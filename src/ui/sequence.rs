//! Sequence wizard: walks the value editor across an ordered field list.
//!
//! Each field may carry a [`FieldHandler`] that supplies the live value on
//! entry and consumes the committed value on exit. A handler that has to
//! wait for the command station answers [`WriteOutcome::Pending`]; the
//! wizard then parks on that field until it is resumed from outside.

use crate::config::PENDING_TIMEOUT_MS;
use crate::ui::edit::EditKind;
use crate::ui::{Fault, Label, Page, Value};

/// Result of handing a committed value to a field handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Value stored; the wizard moves on.
    Accepted,
    /// Stored asynchronously; the wizard parks on this field.
    Pending,
    /// Value refused; the fault is shown and the wizard stays put.
    Rejected(Fault),
}

/// Bridge between a wizard field and the data it edits.
pub trait FieldHandler<C>: Sync {
    /// Current value of the field, or `None` to use the static initial value.
    fn read(&self, _ctx: &mut C, _flags: u32) -> Option<Value> {
        None
    }

    fn write(&self, ctx: &mut C, flags: u32, value: &Value) -> WriteOutcome;
}

/// Per-kind bound plus the value shown when the handler has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: u8, initial: &'static str },
    Integer { digits: u8, initial: Option<u32> },
    Choice { options: &'static [&'static str], initial: u8 },
    Ip { initial: [u8; 4] },
}

impl FieldKind {
    pub fn edit_kind(&self) -> EditKind {
        match *self {
            FieldKind::Text { max_len, .. } => EditKind::Text { max_len },
            FieldKind::Integer { digits, .. } => EditKind::Integer { digits },
            FieldKind::Choice { options, .. } => EditKind::Choice { options },
            FieldKind::Ip { .. } => EditKind::Ip,
        }
    }

    pub fn initial(&self) -> Option<Value> {
        match *self {
            FieldKind::Text { initial, .. } => Some(Value::text(initial)),
            FieldKind::Integer { initial, .. } => initial.map(Value::Integer),
            FieldKind::Choice { initial, .. } => Some(Value::Choice(initial)),
            FieldKind::Ip { initial } => Some(Value::Ip(initial)),
        }
    }

    /// Whether `value` has the shape this kind edits.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text { .. }, Value::Text(_))
                | (FieldKind::Integer { .. }, Value::Integer(_))
                | (FieldKind::Choice { .. }, Value::Choice(_))
                | (FieldKind::Ip { .. }, Value::Ip(_))
        )
    }
}

/// Static definition of one wizard step.
pub struct WizardField<C: 'static> {
    /// Shown on the bottom line while the field is edited.
    pub name: Option<&'static Label>,
    /// Read-only text in front of the value.
    pub prefix: Option<&'static Label>,
    pub kind: FieldKind,
    pub handler: Option<&'static dyn FieldHandler<C>>,
}

/// How the editor (or the outside world) finished the current field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The user backed out.
    Aborted,
    /// A committed value for the handler.
    Value(Value),
    /// The field's pending operation completed; advance without writing.
    Satisfied,
}

/// What the engine has to do after a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    /// Open the editor on the (new) current field.
    Next,
    /// Waiting for an external completion.
    Parked,
    /// Last field done; return to the page.
    Finished(Page),
    /// Discard the wizard and return to the page.
    Aborted(Page),
    /// Show the fault; the wizard keeps its position.
    Rejected(Fault),
    /// Nothing to do.
    Ignored,
}

/// A running wizard.
pub struct WizardState<C: 'static> {
    caller: Page,
    index: usize,
    flags: u32,
    fields: &'static [WizardField<C>],
    parked_since: Option<u64>,
}

impl<C: 'static> WizardState<C> {
    pub fn new(caller: Page, flags: u32, fields: &'static [WizardField<C>]) -> Self {
        Self {
            caller,
            index: 0,
            flags,
            fields,
            parked_since: None,
        }
    }

    pub fn caller(&self) -> Page {
        self.caller
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_parked(&self) -> bool {
        self.parked_since.is_some()
    }

    pub fn field(&self) -> Option<&'static WizardField<C>> {
        let fields: &'static [WizardField<C>] = self.fields;
        fields.get(self.index)
    }

    /// Value to seed the editor with for the current field.
    pub fn prepare(&self, ctx: &mut C) -> Option<Value> {
        let field = self.field()?;
        if let Some(value) = field.handler.and_then(|h| h.read(ctx, self.flags)) {
            if field.kind.accepts(&value) {
                return Some(value);
            }
            error!("field {} read a value of another kind", self.index);
        }
        field.kind.initial()
    }

    /// Hand the result of the current field to its handler.
    pub fn submit(&mut self, ctx: &mut C, submission: Submission, now: u64) -> WizardStep {
        let value = match submission {
            Submission::Aborted => {
                debug!("wizard aborted at field {}", self.index);
                return WizardStep::Aborted(self.caller);
            }
            Submission::Satisfied => {
                if !self.is_parked() {
                    warn!("completion for field {} that was not pending", self.index);
                }
                self.parked_since = None;
                return self.advance();
            }
            Submission::Value(value) => value,
        };

        if self.is_parked() {
            warn!("field {} still pending, value ignored", self.index);
            return WizardStep::Ignored;
        }
        let field = match self.field() {
            Some(field) => field,
            None => return WizardStep::Finished(self.caller),
        };

        let outcome = match field.handler {
            Some(handler) => handler.write(ctx, self.flags, &value),
            None => WriteOutcome::Accepted,
        };
        match outcome {
            WriteOutcome::Accepted => {
                info!("field {} accepted", self.index);
                self.advance()
            }
            WriteOutcome::Pending => {
                info!("field {} pending", self.index);
                self.parked_since = Some(now);
                WizardStep::Parked
            }
            WriteOutcome::Rejected(fault) => {
                warn!("field {} rejected with code {}", self.index, fault.code);
                WizardStep::Rejected(fault)
            }
        }
    }

    fn advance(&mut self) -> WizardStep {
        self.index += 1;
        if self.index >= self.fields.len() {
            WizardStep::Finished(self.caller)
        } else {
            WizardStep::Next
        }
    }

    /// Move to `index`, dropping any pending wait. False if out of range.
    pub fn resume_at(&mut self, index: usize) -> bool {
        if index >= self.fields.len() {
            error!("resume at field {} of {}", index, self.fields.len());
            return false;
        }
        self.index = index;
        self.parked_since = None;
        true
    }

    /// True once a parked field has waited longer than the deadline.
    pub fn pending_expired(&self, now: u64) -> bool {
        self.parked_since
            .is_some_and(|since| now.saturating_sub(since) >= PENDING_TIMEOUT_MS)
    }

    pub fn cancel_pending(&mut self) {
        self.parked_since = None;
    }
}
