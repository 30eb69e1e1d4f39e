//! Decode sessions.
//!
//! A decode session is an open handle to one video source that yields
//! sequential frames and can rewind to the first frame. The playback engine
//! and the preview generator only ever talk to sources through the
//! [`DecodeSession`] trait, so the backends below are interchangeable:
//!
//! - [`FfmpegSession`]: in-process demux + decode via `ffmpeg-next`.
//! - [`SubprocessSession`]: raw frames piped out of an `ffmpeg` child
//!   process.
//!
//! Sessions are created through a [`SessionOpener`]. Openers are shared
//! across threads; sessions are not required to be [`Send`] because the
//! playback engine constructs its session on the pacing thread and never
//! moves it.

mod ffmpeg;
mod subprocess;

use image::{DynamicImage, RgbImage};

use crate::error::ShelfError;

pub use self::ffmpeg::{FfmpegOpener, FfmpegSession};
pub use self::subprocess::{SubprocessOpener, SubprocessSession};

/// Byte order of a packed 24-bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelLayout {
    /// Red, green, blue. The display layout.
    #[default]
    Rgb24,
    /// Blue, green, red, as produced by capture-style decoders.
    Bgr24,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        3
    }

    /// Name understood by FFmpeg's `-pix_fmt` option.
    pub(crate) fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelLayout::Rgb24 => "rgb24",
            PixelLayout::Bgr24 => "bgr24",
        }
    }
}

/// One decoded picture with tightly packed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::InvalidFrame`] if `data` is not exactly
    /// `width × height × 3` bytes.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self, ShelfError> {
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if data.len() != expected {
            return Err(ShelfError::InvalidFrame {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Raw packed pixel bytes in [`layout`](Frame::layout) order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert to the RGB display layout, swapping channels in place when
    /// the frame is BGR.
    pub fn into_rgb(mut self) -> Self {
        if self.layout == PixelLayout::Bgr24 {
            for pixel in self.data.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
            self.layout = PixelLayout::Rgb24;
        }
        self
    }

    /// Convert to an [`image::DynamicImage`] in RGB8.
    pub fn into_image(self) -> Result<DynamicImage, ShelfError> {
        let rgb = self.into_rgb();
        let (width, height) = (rgb.width, rgb.height);
        let buffer = RgbImage::from_raw(width, height, rgb.data).ok_or_else(|| {
            ShelfError::FrameRead(format!(
                "Failed to construct a {width}x{height} RGB image from frame data"
            ))
        })?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

/// An open, readable video source.
///
/// Only the thread that opened a session calls into it. After
/// [`release`](DecodeSession::release) no other method is called.
pub trait DecodeSession {
    /// Frame rate reported by the source. `0.0` or a non-finite value means
    /// unknown.
    fn frame_rate(&self) -> f64;

    /// Decode the next frame. `Ok(None)` means end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, ShelfError>;

    /// Rewind so the next call to [`next_frame`](DecodeSession::next_frame)
    /// yields the first frame again.
    fn seek_to_start(&mut self) -> Result<(), ShelfError>;

    /// Release decoder resources. Called exactly once by the owner.
    fn release(&mut self);
}

/// Factory for decode sessions bound to a URL.
pub trait SessionOpener: Send + Sync {
    /// Open a session for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::SourceUnavailable`] (or
    /// [`ShelfError::NoVideoStream`]) when the source cannot be decoded.
    fn open(&self, url: &str) -> Result<Box<dyn DecodeSession>, ShelfError>;
}

impl<F> SessionOpener for F
where
    F: Fn(&str) -> Result<Box<dyn DecodeSession>, ShelfError> + Send + Sync,
{
    fn open(&self, url: &str) -> Result<Box<dyn DecodeSession>, ShelfError> {
        self(url)
    }
}

/// Releases a session when dropped.
///
/// Gives every exit path of a scoped decode (including `?` returns and
/// panics) the same cleanup.
pub(crate) struct SessionGuard {
    session: Box<dyn DecodeSession>,
}

impl SessionGuard {
    pub(crate) fn new(session: Box<dyn DecodeSession>) -> Self {
        Self { session }
    }

    pub(crate) fn session(&mut self) -> &mut dyn DecodeSession {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.release();
    }
}
