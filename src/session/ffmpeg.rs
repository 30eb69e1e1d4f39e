//! In-process frame pump backed by `ffmpeg-next`.

use std::path::Path;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::ShelfError;
use crate::session::{DecodeSession, Frame, PixelLayout, SessionOpener};

/// Opens [`FfmpegSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl SessionOpener for FfmpegOpener {
    fn open(&self, url: &str) -> Result<Box<dyn DecodeSession>, ShelfError> {
        Ok(Box::new(FfmpegSession::open(url)?))
    }
}

/// A decode session that demuxes and decodes in-process.
///
/// Packets are read one at a time until the decoder yields a picture, which
/// is scaled into packed RGB24. Non-video packets are skipped.
pub struct FfmpegSession {
    url: String,
    input_context: Option<Input>,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    frames_per_second: f64,
    width: u32,
    height: u32,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
}

impl FfmpegSession {
    /// Open `url` (a local path or anything FFmpeg's protocols accept).
    ///
    /// # Errors
    ///
    /// - [`ShelfError::SourceUnavailable`] if the input cannot be opened or
    ///   its decoder cannot be created.
    /// - [`ShelfError::NoVideoStream`] if the source has no video.
    pub fn open(url: &str) -> Result<Self, ShelfError> {
        crate::ffmpeg::ensure_initialized(url)?;
        log::debug!("Opening decode session: {url}");

        let unavailable = |reason: String| ShelfError::SourceUnavailable {
            url: url.to_string(),
            reason,
        };

        let input_context = ffmpeg_next::format::input(Path::new(url))
            .map_err(|error| unavailable(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(ShelfError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let frames_per_second = {
            let average = crate::utilities::rational_to_frames_per_second(stream.avg_frame_rate());
            if average > 0.0 {
                average
            } else {
                crate::utilities::rational_to_frames_per_second(stream.rate())
            }
        };

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| unavailable(format!("Failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| unavailable(format!("Failed to create video decoder: {error}")))?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| unavailable(format!("Failed to create scaler: {error}")))?;

        log::debug!(
            "Decode session ready: {width}x{height} @ {frames_per_second:.3} fps (stream {video_stream_index})"
        );

        Ok(Self {
            url: url.to_string(),
            input_context: Some(input_context),
            decoder,
            scaler,
            video_stream_index,
            frames_per_second,
            width,
            height,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
        })
    }

    /// Source URL this session was opened with.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decoded picture size.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn convert_current_frame(&mut self) -> Result<Frame, ShelfError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
        let buffer =
            crate::utilities::frame_to_buffer(&self.scaled_frame, self.width, self.height, 3);
        Frame::new(self.width, self.height, PixelLayout::Rgb24, buffer)
    }
}

impl DecodeSession for FfmpegSession {
    fn frame_rate(&self) -> f64 {
        self.frames_per_second
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ShelfError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let Some(input_context) = self.input_context.as_mut() else {
                return Ok(None);
            };
            let mut packet = Packet::empty();
            match packet.read(input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|error| ShelfError::FrameRead(error.to_string()))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|error| ShelfError::FrameRead(error.to_string()))?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(ShelfError::FrameRead(error.to_string())),
            }
        }
    }

    fn seek_to_start(&mut self) -> Result<(), ShelfError> {
        let Some(input_context) = self.input_context.as_mut() else {
            return Ok(());
        };
        input_context.seek(0, ..0)?;
        self.decoder.flush();
        self.eof_sent = false;
        log::trace!("Rewound {}", self.url);
        Ok(())
    }

    fn release(&mut self) {
        if self.input_context.take().is_some() {
            log::debug!("Released decode session: {}", self.url);
        }
    }
}
