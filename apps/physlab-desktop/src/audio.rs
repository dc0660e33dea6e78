use physlab_kernel::{AudioError, SoundEffect};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Plays clips on the default output device.
pub struct RodioSound {
    // Dropping the stream stops all sound.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioSound {
    pub fn open() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl SoundEffect for RodioSound {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        let file = File::open(path).map_err(|_| AudioError::Missing(path.to_path_buf()))?;
        let playback = |reason: String| AudioError::Playback {
            path: path.to_path_buf(),
            reason,
        };
        let source = Decoder::new(BufReader::new(file)).map_err(|e| playback(e.to_string()))?;
        self.handle
            .play_raw(source.convert_samples())
            .map_err(|e| playback(e.to_string()))
    }
}
