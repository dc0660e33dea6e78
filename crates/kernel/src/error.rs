use crate::config::ConfigError;
use physlab_physics::PhysicsError;
use physlab_render::MeshId;

/// Errors surfaced by building or running a lab session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("scene has no mesh {0:?}")]
    MissingMesh(MeshId),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("session already shut down")]
    Stopped,
}
