use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("sound asset not found: {0}")]
    Missing(PathBuf),
    #[error("audio output unavailable: {0}")]
    Device(String),
    #[error("could not play {path}: {reason}")]
    Playback { path: PathBuf, reason: String },
}

/// Fire-and-forget playback of a short sound clip.
///
/// Callers treat every error as non-fatal.
pub trait SoundEffect {
    fn play(&mut self, path: &Path) -> Result<(), AudioError>;
}

/// Records requests instead of playing them. Used headless and in tests.
#[derive(Debug, Default)]
pub struct SilentSound {
    pub played: Vec<PathBuf>,
    /// Fail when the clip does not exist on disk.
    pub check_exists: bool,
}

impl SilentSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checking_files() -> Self {
        Self {
            played: Vec::new(),
            check_exists: true,
        }
    }
}

impl SoundEffect for SilentSound {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        if self.check_exists && !path.is_file() {
            return Err(AudioError::Missing(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "sound (muted)");
        self.played.push(path.to_path_buf());
        Ok(())
    }
}
