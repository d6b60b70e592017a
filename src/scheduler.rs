//! Frame scheduling.
//!
//! One frame is a draw of the current generation followed by exactly one
//! tick. Between frames the scheduler waits `RenderState::delay`, then asks
//! the host for the next display refresh.
//!
//! The host owns the two waiting primitives and reports back when they
//! complete:
//!
//! ```text
//! start ──▶ Scheduled ──on_frame──▶ Drawing ──▶ Ticking ──▶ Waiting
//!              ▲                      │                       │
//!              │                      └──▶ Halted ◀── run_once┤
//!              └────────────── on_delay_elapsed ──────────────┘
//! ```

use std::time::Duration;

use log::{debug, error, trace};

use crate::reader::CellBufferError;
use crate::render::{Canvas, Renderer};
use crate::universe::Engine;

/// Waiting primitives supplied by the event loop.
pub trait FrameHost {
    /// Deliver `FrameScheduler::on_frame` on the next display refresh.
    fn request_frame(&mut self);
    /// Deliver `FrameScheduler::on_delay_elapsed` after `delay`.
    fn request_delay(&mut self, delay: Duration);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Scheduled,
    Drawing,
    Ticking,
    Waiting,
    /// A delay expired while paused; `resume` picks up from here.
    Paused,
    Halted,
}

/// Mutable render settings shared between the input handler and the
/// scheduler.
#[derive(Debug, Clone)]
pub struct RenderState {
    time_between_ticks_ms: u32,
    min_delay_ms: u32,
    max_delay_ms: u32,
    run_once: bool,
    first_run: bool,
}

impl RenderState {
    pub fn new(
        time_between_ticks_ms: u32,
        min_delay_ms: u32,
        max_delay_ms: u32,
        run_once: bool,
    ) -> Self {
        let mut state = Self {
            time_between_ticks_ms: min_delay_ms,
            min_delay_ms,
            max_delay_ms: max_delay_ms.max(min_delay_ms),
            run_once,
            first_run: true,
        };
        state.set_time_between_ticks(time_between_ticks_ms);
        state
    }

    pub fn time_between_ticks_ms(&self) -> u32 {
        self.time_between_ticks_ms
    }

    /// Clamped to the configured range.
    pub fn set_time_between_ticks(&mut self, ms: u32) {
        self.time_between_ticks_ms = ms.clamp(self.min_delay_ms, self.max_delay_ms);
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.time_between_ticks_ms.into())
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// Cleared after the first completed draw. Nothing reads it yet.
    pub fn first_run(&self) -> bool {
        self.first_run
    }
}

/// Speed slider over `[0, max_speed]`. Higher values mean shorter waits.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SpeedControl {
    value: u32,
    max_speed: u32,
}

impl SpeedControl {
    /// Starts at the midpoint.
    pub fn new(max_speed: u32) -> Self {
        Self { value: max_speed / 2, max_speed }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    /// Delay the current value maps to.
    pub fn delay_ms(&self) -> u32 {
        self.max_speed - self.value
    }

    /// Move the slider and push the resulting delay into `state`. The wait
    /// already in progress keeps its old length.
    pub fn set_value(&mut self, value: u32, state: &mut RenderState) {
        self.value = value.min(self.max_speed);
        state.set_time_between_ticks(self.delay_ms());
        debug!(
            "speed {} of {}, time between ticks {} ms",
            self.value,
            self.max_speed,
            state.time_between_ticks_ms()
        );
    }

    pub fn step(&mut self, delta: i64, state: &mut RenderState) {
        let value = (i64::from(self.value) + delta).clamp(0, i64::from(self.max_speed));
        self.set_value(value as u32, state);
    }
}

#[derive(Debug)]
pub struct FrameScheduler {
    phase: Phase,
    frames: u64,
    paused: bool,
    cancelled: bool,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            frames: 0,
            paused: false,
            cancelled: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed draw + tick pairs.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Whether a delivered frame would be drawn.
    pub fn wants_frame(&self) -> bool {
        self.phase == Phase::Scheduled
    }

    fn enter(&mut self, phase: Phase) {
        trace!("frame scheduler {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn schedule<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.cancelled {
            self.enter(Phase::Halted);
            return;
        }
        self.enter(Phase::Scheduled);
        host.request_frame();
    }

    /// Request the first frame. Only meaningful while idle.
    pub fn start<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.phase == Phase::Idle {
            self.schedule(host);
        }
    }

    /// Draw the engine's current generation, then tick it once.
    ///
    /// Frames delivered while not `Scheduled` are ignored. If drawing fails
    /// the engine is not ticked and the scheduler halts.
    pub fn on_frame<H, E, C>(
        &mut self,
        host: &mut H,
        state: &mut RenderState,
        renderer: &Renderer,
        engine: &mut E,
        canvas: &mut C,
    ) -> Result<(), CellBufferError>
    where
        H: FrameHost + ?Sized,
        E: Engine + ?Sized,
        C: Canvas + ?Sized,
    {
        if self.phase != Phase::Scheduled {
            trace!("ignoring frame delivered while {:?}", self.phase);
            return Ok(());
        }

        self.enter(Phase::Drawing);
        if let Err(err) = renderer.draw(canvas, engine) {
            error!("aborting frame {}: {err}", self.frames);
            self.enter(Phase::Halted);
            return Err(err);
        }
        state.first_run = false;

        self.enter(Phase::Ticking);
        engine.tick();
        self.frames += 1;

        if state.run_once() {
            debug!("run once: halting after the first frame");
            self.enter(Phase::Halted);
        } else {
            self.enter(Phase::Waiting);
            host.request_delay(state.delay());
        }
        Ok(())
    }

    /// The inter-tick wait is over.
    pub fn on_delay_elapsed<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.phase != Phase::Waiting {
            return;
        }
        if self.paused && !self.cancelled {
            self.enter(Phase::Paused);
            return;
        }
        self.schedule(host);
    }

    pub fn pause(&mut self) {
        if !self.is_halted() {
            debug!("paused");
            self.paused = true;
        }
    }

    pub fn resume<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if !self.paused {
            return;
        }
        debug!("resumed");
        self.paused = false;
        if self.phase == Phase::Paused {
            self.schedule(host);
        }
    }

    pub fn toggle_pause<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.paused {
            self.resume(host);
        } else {
            self.pause();
        }
    }

    /// Stop the loop. Takes effect at the next transition into `Scheduled`;
    /// an already requested frame is still drawn.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        if matches!(self.phase, Phase::Idle | Phase::Paused) {
            self.enter(Phase::Halted);
        }
    }
}
