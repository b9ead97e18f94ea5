//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers (no closures, no
//! dynamic dispatch). Handlers never do I/O: the service performs the
//! capture, classification and actuation a state asks for, writes the
//! result into the context, and ticks again.
//!
//! ```text
//!  IDLE ──[object < distance, not cooling]──▶ TRIGGERED ──▶ CAPTURING
//!    ▲                                                        │
//!    ├────────────────[no frame]──────────────────────────────┤
//!    │                                                        ▼
//!    ├────────────────[classify error]──────────────────── CLASSIFYING
//!    │                                                        │
//!    ├────────────────[coverage < threshold]────────────── DECIDING
//!    │                                                        │
//!    └────────────────[done / fault]──────────────────── DISPENSING
//! ```

use log::{debug, info, warn};

use super::context::{CycleOutcome, FsmContext, Gate};
use super::{StateHandlers, StateId};
use crate::app::events::DispenseEvent;
use crate::sensors::DistanceReading;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateHandlers; StateId::COUNT] {
    [
        // Index 0: Idle
        StateHandlers {
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Triggered
        StateHandlers {
            on_enter: Some(triggered_enter),
            on_exit: None,
            on_update: triggered_update,
        },
        // Index 2: Capturing
        StateHandlers {
            on_enter: Some(capturing_enter),
            on_exit: None,
            on_update: capturing_update,
        },
        // Index 3: Classifying
        StateHandlers {
            on_enter: None,
            on_exit: Some(classifying_exit),
            on_update: classifying_update,
        },
        // Index 4: Deciding
        StateHandlers {
            on_enter: None,
            on_exit: None,
            on_update: deciding_update,
        },
        // Index 5: Dispensing
        StateHandlers {
            on_enter: Some(dispensing_enter),
            on_exit: None,
            on_update: dispensing_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: polling the distance sensor
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.triggered_at = None;
    debug!("IDLE: watching for objects within {} cm", ctx.config.detection_distance_cm);
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    let distance_cm = match ctx.distance {
        DistanceReading::NoReading => {
            ctx.gate = Gate::NoReading;
            ctx.outcome = Some(CycleOutcome::NoReading);
            return None;
        }
        DistanceReading::Cm(cm) => cm,
    };

    if !ctx.distance.is_within(ctx.config.detection_distance_cm) {
        ctx.gate = Gate::Clear;
        ctx.outcome = Some(CycleOutcome::Clear { distance_cm });
        return None;
    }

    if let Some(remaining) = ctx.cooldown_remaining() {
        ctx.gate = Gate::CoolingDown { remaining };
        ctx.outcome = Some(CycleOutcome::CoolingDown { remaining });
        return None;
    }

    ctx.gate = Gate::Engaged;
    ctx.triggered_at = Some(ctx.now);
    Some(StateId::Triggered)
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRIGGERED: object in range and eligible
// ═══════════════════════════════════════════════════════════════════════════

fn triggered_enter(ctx: &mut FsmContext) {
    ctx.clear_cycle();
    info!("TRIGGERED: object detected at {}", ctx.distance);
}

fn triggered_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::Capturing)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CAPTURING: waiting on the still-capture result
// ═══════════════════════════════════════════════════════════════════════════

fn capturing_enter(_ctx: &mut FsmContext) {
    debug!("CAPTURING: requesting still frame");
}

fn capturing_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.frame.is_some() {
        return Some(StateId::Classifying);
    }
    if let Some(e) = ctx.capture_error {
        warn!("CAPTURING: no frame ({}), cooldown unchanged", e);
        ctx.outcome = Some(CycleOutcome::CaptureFailed(e));
        return Some(StateId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLASSIFYING: waiting on the coverage measurement
// ═══════════════════════════════════════════════════════════════════════════

fn classifying_exit(ctx: &mut FsmContext) {
    // The frame is consumed by classification; never carry it forward.
    ctx.frame = None;
}

fn classifying_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.classification.is_some() {
        return Some(StateId::Deciding);
    }
    if let Some(e) = ctx.classify_error {
        warn!("CLASSIFYING: {}, treating as no match", e);
        ctx.outcome = Some(CycleOutcome::ClassifyFailed(e));
        return Some(StateId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DECIDING: threshold comparison
// ═══════════════════════════════════════════════════════════════════════════

fn deciding_update(ctx: &mut FsmContext) -> Option<StateId> {
    let Some(result) = ctx.classification else {
        return Some(StateId::Idle);
    };
    let threshold = ctx.config.color_match_threshold_pct;

    if result.meets(threshold) {
        info!(
            "DECIDING: {:.1}% {} ≥ {:.1}% → dispense",
            result.coverage_pct, ctx.config.target_color, threshold
        );
        return Some(StateId::Dispensing);
    }

    info!(
        "DECIDING: {:.1}% {} < {:.1}% → no feed",
        result.coverage_pct, ctx.config.target_color, threshold
    );
    ctx.outcome = Some(CycleOutcome::NoMatch(result));
    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISPENSING: waiting on the actuation result
// ═══════════════════════════════════════════════════════════════════════════

fn dispensing_enter(ctx: &mut FsmContext) {
    info!(
        "DISPENSING: food at {:.0}%, step {:.0}%",
        ctx.food.pct(),
        ctx.config.food_step_pct
    );
}

fn dispensing_update(ctx: &mut FsmContext) -> Option<StateId> {
    let result = ctx.dispense_result.take()?;
    let at = ctx.triggered_at.unwrap_or(ctx.now);

    match result {
        Ok(()) => {
            ctx.cooldown.mark(at);
            ctx.food.consume(ctx.config.food_step_pct);
            ctx.dispense_count = ctx.dispense_count.saturating_add(1);
            let event = DispenseEvent::succeeded(at, ctx.classification, ctx.food.pct());
            info!(
                "DISPENSING: fed, food now {:.0}%, next feed in {}s",
                ctx.food.pct(),
                ctx.config.cycle_secs
            );
            ctx.outcome = Some(CycleOutcome::Dispensed(event));
        }
        Err(fault) => {
            warn!("DISPENSING: actuation failed ({}), servo stopped", fault);
            let event = DispenseEvent::failed(at, ctx.classification, ctx.food.pct(), fault);
            ctx.outcome = Some(CycleOutcome::DispenseFailed(event));
        }
    }
    Some(StateId::Idle)
}

