//! winit + pixels window, pumped cooperatively from the driver's wait loop.
//!
//! There is no `run_app` here: every `poll_abort` pumps pending window events with a zero
//! timeout, so the single driver thread owns both presentation timing and event handling.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use eegstim_core::Line;
use eegstim_experiment::{AbortReason, DisplayError, DisplayMode, DisplaySurface, InputSource};
use eegstim_render::SkiaTextRenderer;
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowId},
};

const WINDOWED_SIZE: LogicalSize<f64> = LogicalSize::new(1280.0, 720.0);

/// How long `open` keeps pumping for the platform to hand out a window.
const OPEN_PUMPS: usize = 200;

struct Surface {
    mode: DisplayMode,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: SkiaTextRenderer,
    lines: Vec<Line>,
    abort: Option<AbortReason>,
    proceed: bool,
    open_error: Option<String>,
}

impl Surface {
    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let mut attributes = Window::default_attributes().with_title("EEG stimulus");
        attributes = match self.mode {
            DisplayMode::Fullscreen => {
                let monitor = monitor.clone().ok_or_else(|| anyhow!("no monitor available"))?;
                attributes
                    .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
                    .with_resizable(false)
            }
            DisplayMode::Windowed => attributes.with_inner_size(WINDOWED_SIZE),
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            mode = ?self.mode,
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = monitor
                .and_then(|m| m.refresh_rate_millihertz())
                .map(|mhz| mhz as f64 / 1000.0),
            "display ready"
        );

        let texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, texture)?);
        self.renderer.resize(size.width.max(1), size.height.max(1))?;

        if self.mode == DisplayMode::Fullscreen {
            window.set_cursor_visible(false);
        }
        self.window = Some(window);
        Ok(())
    }

    /// Draws the current lines and presents the frame.
    fn draw(&mut self) -> Result<()> {
        let pixels = self
            .pixels
            .as_mut()
            .ok_or_else(|| anyhow!("window not created"))?;
        let stats = self.renderer.render_lines(&self.lines, pixels.frame_mut())?;
        pixels.render().context("cannot present frame")?;
        trace!(
            lines = stats.lines,
            layout_us = stats.layout.as_micros() as u64,
            copy_us = stats.copy.as_micros() as u64,
            total_us = stats.total.as_micros() as u64,
            "frame"
        );
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        // Minimised.
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        self.renderer.resize(size.width, size.height)?;
        debug!(width = size.width, height = size.height, "display resized");
        self.draw()
    }

    fn handle_key(&mut self, key: PhysicalKey) {
        match key {
            PhysicalKey::Code(KeyCode::Escape) => self.request_abort(AbortReason::OperatorRequested),
            PhysicalKey::Code(KeyCode::Space) => self.proceed = true,
            _ => {}
        }
    }

    fn request_abort(&mut self, reason: AbortReason) {
        if self.abort.is_none() {
            info!(%reason, "abort requested");
            self.abort = Some(reason);
        }
    }
}

impl ApplicationHandler for Surface {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "cannot create window");
                self.open_error = Some(format!("{e:#}"));
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.request_abort(AbortReason::DisplayClosed)
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(event.physical_key)
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    self.request_abort(AbortReason::DisplayFailure(format!("{e:#}")));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    if let Err(e) = self.handle_resize(size) {
                        self.request_abort(AbortReason::DisplayFailure(format!("{e:#}")));
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.draw() {
                    self.request_abort(AbortReason::DisplayFailure(format!("{e:#}")));
                }
            }
            _ => {}
        }
    }
}

/// The participant-facing window, doubling as the driver's input source.
pub struct WindowFrontend {
    event_loop: EventLoop<()>,
    surface: Surface,
}

impl WindowFrontend {
    pub fn open(mode: DisplayMode, renderer: SkiaTextRenderer) -> Result<Self> {
        let event_loop = EventLoop::new().context("cannot connect to the window system")?;
        let mut frontend = Self {
            event_loop,
            surface: Surface {
                mode,
                window: None,
                pixels: None,
                renderer,
                lines: Vec::new(),
                abort: None,
                proceed: false,
                open_error: None,
            },
        };

        for _ in 0..OPEN_PUMPS {
            frontend.pump(Some(Duration::from_millis(10)));
            if let Some(e) = frontend.surface.open_error.take() {
                bail!("cannot open {mode:?} window: {e}");
            }
            if frontend.surface.window.is_some() {
                return Ok(frontend);
            }
        }
        bail!("window system never created a window")
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.surface) {
            warn!(code, "event loop exited");
            self.surface.request_abort(AbortReason::DisplayClosed);
        }
    }
}

impl DisplaySurface for WindowFrontend {
    fn render(&mut self, lines: &[Line]) -> Result<(), DisplayError> {
        self.surface.lines = lines.to_vec();
        self.surface
            .draw()
            .map_err(|e| DisplayError(format!("{e:#}")))
    }
}

impl InputSource for WindowFrontend {
    fn poll_abort(&mut self) -> Option<AbortReason> {
        self.pump(Some(Duration::ZERO));
        self.surface.abort.take()
    }

    fn poll_proceed(&mut self) -> bool {
        std::mem::take(&mut self.surface.proceed)
    }
}

impl Drop for WindowFrontend {
    fn drop(&mut self) {
        if let Some(window) = &self.surface.window {
            window.set_cursor_visible(true);
        }
        debug!("display released");
    }
}
