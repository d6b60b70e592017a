pub mod reader;
pub mod render;
pub mod scheduler;
pub mod settings;
pub mod universe;

use std::time::{Duration, Instant};

use error_iter::ErrorIter as _;
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowBuilder};
use winit_input_helper::WinitInputHelper;

use crate::render::{Frame, Renderer};
use crate::scheduler::{FrameHost, FrameScheduler, RenderState, SpeedControl};
use crate::settings::Settings;
use crate::universe::{Engine, Universe};

/// Slider movement per Up/Down key press.
const SPEED_STEP: i64 = 10;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create the event loop")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to open a window")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create or render the pixel surface")]
    Pixels(#[from] pixels::Error),

    #[error("failed to resize the pixel surface")]
    Texture(#[from] pixels::TextureError),
}

/// Pending wake-up of the event loop.
#[derive(Debug, Default)]
struct DelayTimer {
    deadline: Option<Instant>,
}

impl DelayTimer {
    fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Take the pending deadline if it has passed.
    fn take_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    fn control_flow(&self) -> ControlFlow {
        match self.deadline {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        }
    }
}

/// Frame host backed by a winit window: frames are redraw requests and
/// delays are event loop wake-ups.
struct WindowHost<'window> {
    window: &'window Window,
    timer: DelayTimer,
}

impl FrameHost for WindowHost<'_> {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }

    fn request_delay(&mut self, delay: Duration) {
        self.timer.arm(Instant::now(), delay);
    }
}

pub fn run(settings: Settings) -> Result<(), Error> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut input = WinitInputHelper::new();

    let mut universe = Universe::with_options(
        settings.width,
        settings.height,
        settings.encoding,
        &settings.pattern,
    );
    let renderer = Renderer::new(settings.cell_size, settings.palette);
    let geometry = renderer.geometry(&universe);
    let (canvas_width, canvas_height) = (geometry.canvas_width(), geometry.canvas_height());

    info!(
        "{}x{} universe, pattern `{}`, {:?} cells, canvas {}x{}",
        universe.width(),
        universe.height(),
        settings.pattern,
        settings.encoding,
        canvas_width,
        canvas_height,
    );

    let window = {
        let size = LogicalSize::new(
            canvas_width as f64 * settings.window_scale,
            canvas_height as f64 * settings.window_scale,
        );
        WindowBuilder::new()
            .with_title("Game of Life")
            .with_inner_size(size)
            .with_min_inner_size(LogicalSize::new(canvas_width as f64, canvas_height as f64))
            .build(&event_loop)?
    };

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(canvas_width, canvas_height, surface_texture)?
    };

    let mut state = RenderState::new(
        settings.time_between_ticks_ms,
        0,
        settings.max_speed,
        settings.run_once,
    );
    let mut speed = SpeedControl::new(settings.max_speed);
    let mut scheduler = FrameScheduler::new();
    let mut host = WindowHost { window: &window, timer: DelayTimer::default() };
    let mut failure: Option<Error> = None;

    scheduler.start(&mut host);

    let res = event_loop.run(|event, elwt| {
        if let Event::WindowEvent { event: WindowEvent::RedrawRequested, .. } = event {
            if scheduler.wants_frame() {
                let mut frame = Frame::new(pixels.frame_mut(), canvas_width, canvas_height);
                let drawn = scheduler.on_frame(
                    &mut host,
                    &mut state,
                    &renderer,
                    &mut universe,
                    &mut frame,
                );
                if let Err(err) = drawn {
                    log_error("draw", &err);
                }
                elwt.set_control_flow(host.timer.control_flow());
            }
            if let Err(err) = pixels.render() {
                log_error("pixels.render", &err);
                failure = Some(err.into());
                elwt.exit();
                return;
            }
        }

        if input.update(&event) {
            if input.key_pressed(KeyCode::Escape) || input.close_requested() {
                scheduler.cancel();
                elwt.exit();
                return;
            }

            if input.key_pressed(KeyCode::Space) {
                scheduler.toggle_pause(&mut host);
            }
            if input.key_pressed(KeyCode::ArrowUp) {
                speed.step(SPEED_STEP, &mut state);
            }
            if input.key_pressed(KeyCode::ArrowDown) {
                speed.step(-SPEED_STEP, &mut state);
            }

            if let Some(size) = input.window_resized() {
                if let Err(err) = pixels.resize_surface(size.width, size.height) {
                    log_error("pixels.resize_surface", &err);
                    failure = Some(err.into());
                    elwt.exit();
                    return;
                }
            }

            if host.timer.take_expired(Instant::now()) {
                scheduler.on_delay_elapsed(&mut host);
            }
            elwt.set_control_flow(host.timer.control_flow());
        }
    });

    info!("stopped after {} frames", scheduler.frames());
    res?;
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn log_error<E: std::error::Error + 'static>(method_name: &str, err: &E) {
    error!("{method_name}() failed: {err}");
    for source in err.sources().skip(1) {
        error!("  Caused by: {source}");
    }
}
