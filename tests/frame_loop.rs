use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use life_canvas::reader::{CellBufferError, Encoding};
use life_canvas::render::{Canvas, Palette, Renderer, Rgba};
use life_canvas::scheduler::{FrameHost, FrameScheduler, Phase, RenderState, SpeedControl};
use life_canvas::universe::{Engine, Universe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Read,
    Tick,
}

/// Engine double that records every buffer read and tick.
struct StubEngine {
    bytes: Vec<u8>,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl StubEngine {
    fn new(calls: Rc<RefCell<Vec<Call>>>) -> Self {
        Self { bytes: vec![0b0000_1001], calls }
    }
}

impl Engine for StubEngine {
    fn width(&self) -> u32 { 2 }
    fn height(&self) -> u32 { 2 }
    fn cells(&self) -> &[u8] {
        self.calls.borrow_mut().push(Call::Read);
        &self.bytes
    }
    fn encoding(&self) -> Encoding { Encoding::BitPacked }
    fn get_index(&self, row: u32, col: u32) -> usize { (row * 2 + col) as usize }
    fn tick(&mut self) {
        self.calls.borrow_mut().push(Call::Tick);
        // flip the diagonal each generation
        self.bytes[0] ^= 0b0000_1111;
    }
}

#[derive(Default)]
struct CountingCanvas {
    lines: usize,
    rects: Vec<Rgba>,
}

impl Canvas for CountingCanvas {
    fn stroke_line(&mut self, _from: (u32, u32), _to: (u32, u32), _color: Rgba) {
        self.lines += 1;
    }

    fn fill_rect(&mut self, _x: u32, _y: u32, _width: u32, _height: u32, color: Rgba) {
        self.rects.push(color);
    }
}

#[derive(Debug, PartialEq)]
enum Request {
    Frame,
    Delay(Duration),
}

/// Deterministic host: requests queue up and are delivered by the test.
#[derive(Default)]
struct FakeHost {
    pending: VecDeque<Request>,
    delays: Vec<Duration>,
}

impl FrameHost for FakeHost {
    fn request_frame(&mut self) {
        self.pending.push_back(Request::Frame);
    }

    fn request_delay(&mut self, delay: Duration) {
        self.pending.push_back(Request::Delay(delay));
    }
}

struct Harness<E: Engine> {
    host: FakeHost,
    scheduler: FrameScheduler,
    state: RenderState,
    renderer: Renderer,
    engine: E,
    canvas: CountingCanvas,
}

impl<E: Engine> Harness<E> {
    fn new(engine: E, run_once: bool) -> Self {
        Self {
            host: FakeHost::default(),
            scheduler: FrameScheduler::new(),
            state: RenderState::new(60, 0, 150, run_once),
            renderer: Renderer::new(5, Palette::default()),
            engine,
            canvas: CountingCanvas::default(),
        }
    }

    /// Deliver the next pending request. Returns false once nothing is
    /// pending.
    fn step(&mut self) -> Result<bool, CellBufferError> {
        match self.host.pending.pop_front() {
            Some(Request::Frame) => {
                self.scheduler.on_frame(
                    &mut self.host,
                    &mut self.state,
                    &self.renderer,
                    &mut self.engine,
                    &mut self.canvas,
                )?;
                Ok(true)
            }
            Some(Request::Delay(delay)) => {
                self.host.delays.push(delay);
                self.scheduler.on_delay_elapsed(&mut self.host);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run until `frames` frames have been drawn.
    fn run_frames(&mut self, frames: u64) {
        while self.scheduler.frames() < frames {
            assert!(self.step().unwrap(), "loop stalled");
        }
    }
}

#[test]
fn every_frame_draws_then_ticks_once() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls.clone()), false);

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(5);

    let expected: Vec<Call> = [Call::Read, Call::Tick].repeat(5);
    assert_eq!(*calls.borrow(), expected);
    assert_eq!(harness.canvas.lines, 5 * 6);
    assert_eq!(harness.canvas.rects.len(), 5 * 4);
    assert_eq!(harness.scheduler.phase(), Phase::Waiting);
    assert!(!harness.state.first_run());
}

#[test]
fn painted_cells_follow_generations() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls), false);
    let palette = Palette::default();

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(2);

    let (a, d) = (palette.alive, palette.dead);
    assert_eq!(harness.canvas.rects, vec![a, d, d, a, d, a, a, d]);
}

#[test]
fn stray_frames_are_ignored() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls.clone()), false);

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(1);

    // an extra redraw while waiting must neither draw nor tick
    harness.host.pending.push_front(Request::Frame);
    assert!(harness.step().unwrap());
    assert_eq!(*calls.borrow(), vec![Call::Read, Call::Tick]);
    assert_eq!(harness.scheduler.phase(), Phase::Waiting);
}

#[test]
fn slider_change_applies_to_next_wait_only() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls), false);
    let mut speed = SpeedControl::new(150);

    harness.scheduler.start(&mut harness.host);
    speed.set_value(140, &mut harness.state);
    harness.run_frames(1);
    assert_eq!(harness.host.pending.back(), Some(&Request::Delay(Duration::from_millis(10))));

    // moved while the wait after frame 1 is pending
    speed.set_value(50, &mut harness.state);
    assert_eq!(harness.host.pending.back(), Some(&Request::Delay(Duration::from_millis(10))));

    harness.run_frames(2);
    harness.step().unwrap();
    assert_eq!(
        harness.host.delays,
        vec![Duration::from_millis(10), Duration::from_millis(100)]
    );
}

#[test]
fn run_once_halts_after_one_pair() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls.clone()), true);

    harness.scheduler.start(&mut harness.host);
    while harness.step().unwrap() {}

    assert_eq!(*calls.borrow(), vec![Call::Read, Call::Tick]);
    assert!(harness.scheduler.is_halted());
    assert!(harness.host.delays.is_empty());
}

#[test]
fn cancel_stops_at_next_schedule() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls.clone()), false);

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(2);
    harness.scheduler.cancel();
    while harness.step().unwrap() {}

    assert_eq!(harness.scheduler.frames(), 2);
    assert!(harness.scheduler.is_halted());
    assert_eq!(calls.borrow().len(), 4);
}

#[test]
fn pause_holds_until_resume() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut harness = Harness::new(StubEngine::new(calls), false);

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(1);
    harness.scheduler.pause();
    while harness.step().unwrap() {}
    assert_eq!(harness.scheduler.phase(), Phase::Paused);
    assert_eq!(harness.scheduler.frames(), 1);

    harness.scheduler.resume(&mut harness.host);
    assert_eq!(harness.scheduler.phase(), Phase::Scheduled);
    harness.run_frames(3);
    assert_eq!(harness.scheduler.frames(), 3);
}

#[test]
fn encoding_skew_aborts_without_ticking() {
    struct Skewed {
        ticks: usize,
    }

    impl Engine for Skewed {
        fn width(&self) -> u32 { 8 }
        fn height(&self) -> u32 { 8 }
        fn cells(&self) -> &[u8] { &[1; 8] }
        fn encoding(&self) -> Encoding { Encoding::BytePerCell }
        fn get_index(&self, row: u32, col: u32) -> usize { (row * 8 + col) as usize }
        fn tick(&mut self) { self.ticks += 1; }
    }

    let mut harness = Harness::new(Skewed { ticks: 0 }, false);
    harness.scheduler.start(&mut harness.host);

    let err = harness.step();
    assert_eq!(err, Err(CellBufferError::BufferSizeMismatch { expected: 64, actual: 8 }));
    assert_eq!(harness.engine.ticks, 0);
    assert_eq!(harness.canvas.lines, 0);
    assert!(harness.scheduler.is_halted());
    assert!(harness.host.pending.is_empty());
}

#[test]
fn glider_through_the_loop() {
    let universe = Universe::try_with_options(10, 10, Encoding::BytePerCell, "glider").unwrap();
    let mut harness = Harness::new(universe, false);

    harness.scheduler.start(&mut harness.host);
    harness.run_frames(4);

    let mut live = Vec::new();
    for row in 0..10 {
        for col in 0..10 {
            if harness.engine.is_alive(row, col) {
                live.push((row, col));
            }
        }
    }
    assert_eq!(live, vec![(7, 9), (8, 7), (8, 9), (9, 8), (9, 9)]);
    assert_eq!(harness.engine.generation(), 4);

    // four frames were painted, each one full grid of 100 cells
    assert_eq!(harness.canvas.rects.len(), 400);
}
