mod control;
mod procedural;
mod scenes;

use anyhow::{Result, bail};
use winit::dpi::LogicalSize;

use lumen_engine::assets::{AssetSource, FileAssetSource};
use lumen_engine::device::GpuInit;
use lumen_engine::input::{InputFrame, InputState};
use lumen_engine::logging::{LoggingConfig, init_logging};
use lumen_engine::session::{ParameterTarget, Scene, SessionConfig};
use lumen_engine::window::{App, AppControl, Runtime, RuntimeConfig};

use control::ControlPanel;
use procedural::ProceduralAssets;
use scenes::SceneKind;

/// Directory of texture files. Without it textures are generated.
const ASSETS_ENV: &str = "LUMEN_ASSETS";

struct Gallery {
    kind: SceneKind,
    assets: Box<dyn AssetSource>,
    panel: ControlPanel,
}

impl App for Gallery {
    type Scene = Box<dyn Scene>;

    fn create_scene(&mut self) -> Result<Self::Scene> {
        Ok(self.kind.create()?)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            frame_mode: self.kind.frame_mode(),
            ..SessionConfig::default()
        }
    }

    fn assets(&self) -> &dyn AssetSource {
        self.assets.as_ref()
    }

    fn on_input(
        &mut self,
        target: &mut dyn ParameterTarget,
        input: &InputState,
        frame: &InputFrame,
    ) -> AppControl {
        self.panel.handle(target, input, frame)
    }
}

fn scene_names() -> String {
    SceneKind::ALL
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let name = std::env::args().nth(1).unwrap_or_else(|| "bezier".to_string());
    let Some(kind) = SceneKind::from_name(&name) else {
        bail!("unknown scene `{name}`; expected one of: {}", scene_names());
    };

    let assets: Box<dyn AssetSource> = match std::env::var_os(ASSETS_ENV) {
        Some(dir) => {
            log::info!("loading textures from {}", dir.to_string_lossy());
            Box::new(FileAssetSource::new(dir))
        }
        None => Box::new(ProceduralAssets::default()),
    };

    let (width, height) = kind.window_size();
    let config = RuntimeConfig {
        title: format!("lumen · {}", kind.name()),
        initial_size: LogicalSize::new(width, height),
    };

    let app = Gallery {
        kind,
        assets,
        panel: ControlPanel::new(),
    };
    Runtime::run(config, GpuInit::default(), app)
}
