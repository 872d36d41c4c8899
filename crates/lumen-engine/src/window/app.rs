use anyhow::Result;

use crate::assets::AssetSource;
use crate::input::{InputFrame, InputState};
use crate::session::{ParameterTarget, Scene, SessionConfig};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by binaries hosting a scene.
pub trait App {
    type Scene: Scene + 'static;

    /// Called once the window exists. The scene is handed to a new session.
    fn create_scene(&mut self) -> Result<Self::Scene>;

    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
    }

    /// Where the session's textures come from.
    fn assets(&self) -> &dyn AssetSource;

    /// Called when keys were pressed. `target` is the running session.
    fn on_input(
        &mut self,
        target: &mut dyn ParameterTarget,
        input: &InputState,
        frame: &InputFrame,
    ) -> AppControl;
}
