//! Detection-cycle state machine.
//!
//! One engagement walks Idle, Triggered, Capturing, Classifying, Deciding,
//! Dispensing and back to Idle, dropping straight back to Idle from any
//! stage that fails or does not match. States are rows of plain `fn`
//! handlers in a table indexed by [`StateId`]. Handlers only read and write
//! the [`FsmContext`] blackboard; the service fills in the I/O result a
//! state is waiting on and ticks again.
//!
//! ```text
//!  state        waits on                  leaves for
//!  ───────────  ────────────────────────  ──────────────────────
//!  Idle         distance reading          Triggered
//!  Triggered    -                         Capturing
//!  Capturing    frame / capture error     Classifying | Idle
//!  Classifying  coverage / classify error Deciding | Idle
//!  Deciding     -                         Dispensing | Idle
//!  Dispensing   actuation result          Idle
//! ```

pub mod context;
pub mod states;

use context::FsmContext;
use log::debug;

/// Detection-loop states, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Triggered = 1,
    Capturing = 2,
    Classifying = 3,
    Deciding = 4,
    Dispensing = 5,
}

impl StateId {
    /// Every state, in the order the table stores them.
    pub const ALL: [StateId; 6] = [
        Self::Idle,
        Self::Triggered,
        Self::Capturing,
        Self::Classifying,
        Self::Deciding,
        Self::Dispensing,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Triggered => "Triggered",
            Self::Capturing => "Capturing",
            Self::Classifying => "Classifying",
            Self::Deciding => "Deciding",
            Self::Dispensing => "Dispensing",
        }
    }
}

/// Runs once when a state is entered or left.
pub type HookFn = fn(&mut FsmContext);

/// Runs every tick; `Some(next)` requests a transition.
pub type UpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// Handlers for one state. The row's position in the table is its id.
pub struct StateHandlers {
    pub on_enter: Option<HookFn>,
    pub on_exit: Option<HookFn>,
    pub on_update: UpdateFn,
}

/// A state change performed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

/// Table-driven engine. The caller owns the [`FsmContext`] and passes it
/// into every call.
pub struct Fsm {
    table: [StateHandlers; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateHandlers; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial,
        }
    }

    /// Run the initial state's `on_enter`. Call once before the first tick.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        debug!("FSM starting in {}", self.current.name());
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Run the current state's update and follow the transition it asks for.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> Option<Transition> {
        let next = (self.row(self.current).on_update)(ctx)?;
        Some(self.switch_to(next, ctx))
    }

    /// Jump to `to` without consulting the current state's update, e.g. to
    /// abandon a cycle on cancellation. No-op if already there.
    pub fn force_transition(&mut self, to: StateId, ctx: &mut FsmContext) -> Option<Transition> {
        (to != self.current).then(|| self.switch_to(to, ctx))
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn row(&self, id: StateId) -> &StateHandlers {
        &self.table[id as usize]
    }

    fn switch_to(&mut self, to: StateId, ctx: &mut FsmContext) -> Transition {
        let from = self.current;
        debug!("FSM {} -> {}", from.name(), to.name());

        if let Some(exit) = self.row(from).on_exit {
            exit(ctx);
        }
        self.current = to;
        if let Some(enter) = self.row(to).on_enter {
            enter(ctx);
        }
        Transition { from, to }
    }
}
