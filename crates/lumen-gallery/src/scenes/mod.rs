//! Tutorial scenes hosted by the gallery.

mod bezier;
mod blinn_phong;
mod mipmap;
mod point_light;
mod projection;
mod ray_march;
mod shading;

use lumen_engine::backend::UniformValue;
use lumen_engine::geometry::GeometryError;
use lumen_engine::math::Vec4;
use lumen_engine::scheduler::FrameMode;
use lumen_engine::session::Scene;

pub use bezier::BezierScene;
pub use blinn_phong::BlinnPhongScene;
pub use mipmap::MipmapScene;
pub use point_light::PointLightScene;
pub use projection::ProjectionScene;
pub use ray_march::RayMarchScene;
pub use shading::ShadingScene;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SceneKind {
    Bezier,
    Shading,
    PointLight,
    BlinnPhong,
    Mipmap,
    Projection,
    RayMarch,
}

impl SceneKind {
    pub const ALL: [SceneKind; 7] = [
        SceneKind::Bezier,
        SceneKind::Shading,
        SceneKind::PointLight,
        SceneKind::BlinnPhong,
        SceneKind::Mipmap,
        SceneKind::Projection,
        SceneKind::RayMarch,
    ];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Bezier => "bezier",
            SceneKind::Shading => "flat-shading",
            SceneKind::PointLight => "point-light",
            SceneKind::BlinnPhong => "blinn-phong",
            SceneKind::Mipmap => "mipmap",
            SceneKind::Projection => "projection-mapping",
            SceneKind::RayMarch => "ray-marching",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Initial window size in logical pixels.
    pub fn window_size(self) -> (f64, f64) {
        match self {
            SceneKind::RayMarch => (800.0, 800.0),
            SceneKind::Mipmap
            | SceneKind::PointLight
            | SceneKind::BlinnPhong
            | SceneKind::Projection => (800.0, 600.0),
            SceneKind::Bezier | SceneKind::Shading => (400.0, 400.0),
        }
    }

    pub fn frame_mode(self) -> FrameMode {
        match self {
            SceneKind::RayMarch => FrameMode::Continuous,
            _ => FrameMode::OnDemand,
        }
    }

    pub fn create(self) -> Result<Box<dyn Scene>, GeometryError> {
        Ok(match self {
            SceneKind::Bezier => Box::new(BezierScene::new()?),
            SceneKind::Shading => Box::new(ShadingScene),
            SceneKind::PointLight => Box::new(PointLightScene),
            SceneKind::BlinnPhong => Box::new(BlinnPhongScene),
            SceneKind::Mipmap => Box::new(MipmapScene),
            SceneKind::Projection => Box::new(ProjectionScene),
            SceneKind::RayMarch => Box::new(RayMarchScene),
        })
    }
}

pub(crate) fn color(r: f32, g: f32, b: f32, a: f32) -> UniformValue {
    UniformValue::Vec4(Vec4::new(r, g, b, a))
}
