// src/playback.rs

//! Playback handles the mixer drives.
//!
//! A handle is bound to one audio locator for its whole life and loops it.
//! The mixer owns exactly two of them and only ever swaps their roles.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device is available")]
    NoOutputDevice,
    #[error("failed to create a playback sink: {0}")]
    Sink(#[from] rodio::PlayError),
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

pub trait AudioHandle {
    /// The locator this handle was opened for.
    fn source(&self) -> &str;
    /// Starts or resumes playback. An error means the platform refused.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    /// Moves the playback position back to the start.
    fn rewind(&mut self);
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
}

pub trait AudioBackend {
    type Handle: AudioHandle;

    /// Opens a looping handle for `src`. Nothing is audible until `play`.
    fn open(&mut self, src: &str) -> Result<Self::Handle, PlaybackError>;
}

pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 1.0)
}

/// Plays scene audio through the default output device.
pub struct RodioBackend {
    // The stream must outlive every sink created from its handle.
    output: Option<(OutputStream, OutputStreamHandle)>,
    asset_root: PathBuf,
}

impl RodioBackend {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        let output = match OutputStream::try_default() {
            Ok(output) => Some(output),
            Err(e) => {
                log::warn!("No audio output available, playback will be refused: {}", e);
                None
            }
        };
        Self {
            output,
            asset_root: asset_root.into(),
        }
    }

    pub fn resolve(&self, src: &str) -> PathBuf {
        self.asset_root.join(Path::new(src))
    }
}

impl AudioBackend for RodioBackend {
    type Handle = RodioHandle;

    fn open(&mut self, src: &str) -> Result<RodioHandle, PlaybackError> {
        let (_, stream_handle) = self.output.as_ref().ok_or(PlaybackError::NoOutputDevice)?;
        let sink = Sink::try_new(stream_handle)?;
        sink.pause();
        sink.set_volume(0.0);
        log::debug!("Opened playback handle for '{}'", src);
        Ok(RodioHandle {
            src: src.to_string(),
            path: self.resolve(src),
            sink,
            loaded: false,
        })
    }
}

pub struct RodioHandle {
    src: String,
    path: PathBuf,
    sink: Sink,
    loaded: bool,
}

impl RodioHandle {
    fn load(&mut self) -> Result<(), PlaybackError> {
        let file = File::open(&self.path).map_err(|source| PlaybackError::Open {
            path: self.path.clone(),
            source,
        })?;
        let source = Decoder::new_looped(BufReader::new(file))?;
        self.sink.append(source);
        self.loaded = true;
        Ok(())
    }
}

impl AudioHandle for RodioHandle {
    fn source(&self) -> &str {
        &self.src
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if !self.loaded {
            self.load()?;
        }
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn rewind(&mut self) {
        // Dropping the queued decoder is the reliable way back to the start;
        // the next `play` decodes the file again.
        self.sink.clear();
        self.loaded = false;
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(clamp01(volume));
    }
}
