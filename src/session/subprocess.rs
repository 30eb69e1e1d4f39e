//! Frames piped out of an external `ffmpeg` process.
//!
//! The child is asked for raw `bgr24` video on stdout, so this backend hands
//! the engine frames in capture order (blue first) and relies on the
//! engine's RGB conversion before display.

use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::error::ShelfError;
use crate::probe::SourceProbe;
use crate::session::{DecodeSession, Frame, PixelLayout, SessionOpener};

/// Opens [`SubprocessSession`]s using the given `ffmpeg` program.
#[derive(Debug, Clone)]
pub struct SubprocessOpener {
    program: String,
}

impl SubprocessOpener {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for SubprocessOpener {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl SessionOpener for SubprocessOpener {
    fn open(&self, url: &str) -> Result<Box<dyn DecodeSession>, ShelfError> {
        Ok(Box::new(SubprocessSession::open(&self.program, url)?))
    }
}

/// A decode session reading fixed-size raw frames from a child process.
///
/// Rewinding restarts the child; releasing kills it. Dropping an unreleased
/// session releases it.
pub struct SubprocessSession {
    program: String,
    url: String,
    width: u32,
    height: u32,
    frames_per_second: f64,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl SubprocessSession {
    const LAYOUT: PixelLayout = PixelLayout::Bgr24;

    /// Probe `url` for its geometry, then start `program` decoding it.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::SourceUnavailable`] if probing fails or the
    /// program cannot be spawned.
    pub fn open(program: &str, url: &str) -> Result<Self, ShelfError> {
        let info = SourceProbe::probe(url)?;
        if info.width == 0 || info.height == 0 {
            return Err(ShelfError::SourceUnavailable {
                url: url.to_string(),
                reason: "Source reports zero frame size".to_string(),
            });
        }

        let mut session = Self {
            program: program.to_string(),
            url: url.to_string(),
            width: info.width,
            height: info.height,
            frames_per_second: info.frames_per_second,
            child: None,
            stdout: None,
        };
        session.spawn()?;
        Ok(session)
    }

    fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * Self::LAYOUT.bytes_per_pixel()
    }

    fn spawn(&mut self) -> Result<(), ShelfError> {
        let mut child = Command::new(&self.program)
            .args(["-nostdin", "-loglevel", "error", "-i"])
            .arg(&self.url)
            .args(["-an", "-sn", "-f", "rawvideo", "-pix_fmt", Self::LAYOUT.ffmpeg_name()])
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| ShelfError::SourceUnavailable {
                url: self.url.clone(),
                reason: format!("Failed to start `{}`: {error}", self.program),
            })?;

        self.stdout = child.stdout.take();
        log::debug!("Spawned `{}` (pid {}) for {}", self.program, child.id(), self.url);
        self.child = Some(child);
        Ok(())
    }

    fn stop_child(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(error) = child.kill() {
                log::trace!("Child for {} already exited: {error}", self.url);
            }
            let _ = child.wait();
        }
    }
}

impl DecodeSession for SubprocessSession {
    fn frame_rate(&self) -> f64 {
        self.frames_per_second
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ShelfError> {
        let size = self.frame_size();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buffer = vec![0_u8; size];
        match stdout.read_exact(&mut buffer) {
            Ok(()) => Frame::new(self.width, self.height, Self::LAYOUT, buffer).map(Some),
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(error) => Err(ShelfError::FrameRead(error.to_string())),
        }
    }

    fn seek_to_start(&mut self) -> Result<(), ShelfError> {
        self.stop_child();
        self.spawn()
    }

    fn release(&mut self) {
        if self.child.is_some() {
            self.stop_child();
            log::debug!("Released subprocess session: {}", self.url);
        }
    }
}

impl Drop for SubprocessSession {
    fn drop(&mut self) {
        self.release();
    }
}
