use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{GpuInit, WgpuBackend};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState, normalize_pointer};
use crate::assets::AssetSource;
use crate::session::{RenderSession, Scene, SessionConfig};

use super::app::{App, AppControl};

/// How often pending asset loads are polled while the loop would otherwise
/// sleep.
const ASSET_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(960.0, 640.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window, runs `app`'s scene in it until the window closes or
    /// the app asks to exit.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry<S: Scene + 'static> {
    input_state: InputState,
    input_frame: InputFrame,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    session: RenderSession<WgpuBackend<'this>, S>,
}

struct AppState<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry<A::Scene>>,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A: App + 'static> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.exit(event_loop);
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        // Dropping the entry disposes the session before the window goes away.
        self.entry = None;
        event_loop.exit();
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry<A::Scene>> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let scene = self.app.create_scene().context("failed to create scene")?;
        let session_config = self.app.session_config();
        let gpu_init = self.gpu_init.clone();
        let assets = self.app.assets();

        WindowEntry::try_new(
            InputState::default(),
            InputFrame::default(),
            window,
            |window| start_session(window, gpu_init, scene, session_config, assets),
        )
    }
}

fn start_session<'w, S: Scene>(
    window: &'w Window,
    gpu_init: GpuInit,
    scene: S,
    config: SessionConfig,
    assets: &dyn AssetSource,
) -> Result<RenderSession<WgpuBackend<'w>, S>> {
    let backend = pollster::block_on(WgpuBackend::new(window, gpu_init))
        .context("GPU initialization failed for window")?;
    let mut session = RenderSession::new(backend, scene, config);
    session
        .initialize(assets)
        .context("failed to initialize session")?;
    Ok(session)
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        match self.create_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_mut() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let waiting = entry.with_mut(|fields| {
            if let Err(err) = fields.session.poll_assets() {
                log::warn!("failed to upload textures: {err}");
            }
            if fields.session.wants_frame() {
                fields.window.request_redraw();
            }
            fields.session.has_pending_assets()
        });

        if waiting {
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                Instant::now() + ASSET_POLL_INTERVAL,
            ));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let mut control = AppControl::Continue;
        let mut fatal = None;

        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.input_state, &event) {
                fields.input_state.apply_event(fields.input_frame, ev);
            }

            if fields.input_frame.pointer_changed {
                let size = fields.window.inner_size();
                match fields
                    .input_state
                    .pointer_pos
                    .and_then(|(x, y)| normalize_pointer(x, y, size.width, size.height))
                {
                    Some(pointer) => fields.session.set_pointer(pointer),
                    None => fields.session.clear_pointer(),
                }
            }

            if !fields.input_frame.keys_pressed.is_empty() {
                control =
                    app.on_input(&mut *fields.session, fields.input_state, fields.input_frame);
            }
            fields.input_frame.clear();

            match &event {
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    fields.session.request_redraw();
                    fields.window.request_redraw();
                }

                WindowEvent::RedrawRequested => {
                    match fields.session.pump(Instant::now()) {
                        Ok(frames) => log::trace!("drew {frames} frame(s)"),
                        Err(err) if err.is_context_loss() => fatal = Some(err),
                        Err(err) => log::warn!("frame failed: {err}"),
                    }
                }

                _ => {}
            }
        });

        if let Some(err) = fatal {
            self.fail(event_loop, anyhow::Error::new(err).context("GPU context lost"));
            return;
        }

        if control == AppControl::Exit || matches!(event, WindowEvent::CloseRequested) {
            self.exit(event_loop);
        }
    }
}
