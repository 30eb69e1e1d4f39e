//! Paced playback.
//!
//! [`PlaybackEngine`] plays one source by pulling frames on a dedicated
//! pacing thread and handing them to a [`FrameSink`]. The UI thread steers
//! it through three shared scalars: a playing flag, a speed multiplier, and
//! a closing flag. No lock spans them; each is an atomic read by the pacing
//! thread and written by the UI thread.
//!
//! The pacing thread is the only code that touches the decode session. It
//! opens the session, reads from it, rewinds it at end of stream, and
//! releases it on the way out. [`PlaybackEngine::close`] waits for that
//! release, so once it returns the session is never called again.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidshelf::{FfmpegOpener, Frame, PlaybackEngine, PlaybackOptions};
//!
//! let mut engine = PlaybackEngine::open(
//!     "input.mp4",
//!     Arc::new(FfmpegOpener),
//!     |frame: &Frame| println!("{}x{}", frame.width(), frame.height()),
//!     &PlaybackOptions::default(),
//! )?;
//! engine.change_speed(0.25);
//! engine.toggle_play_pause();
//! engine.close();
//! # Ok::<(), vidshelf::ShelfError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::configuration::{MIN_PAUSE_POLL_INTERVAL, MIN_SPEED, PlaybackOptions};
use crate::error::ShelfError;
use crate::session::{DecodeSession, Frame, SessionOpener};

/// UI-side acceptor of decoded frames.
///
/// Called on the pacing thread with frames already in RGB layout.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame);
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame) + Send,
{
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Where a playback session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    /// Closed. Terminal.
    Stopped,
}

/// Scalars shared between the UI thread and the pacing thread.
#[derive(Debug)]
struct SharedControls {
    playing: AtomicBool,
    speed_bits: AtomicU64,
    closing: AtomicBool,
    frames_presented: AtomicU64,
    loops_completed: AtomicU64,
}

impl SharedControls {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(true),
            speed_bits: AtomicU64::new(1.0_f64.to_bits()),
            closing: AtomicBool::new(false),
            frames_presented: AtomicU64::new(0),
            loops_completed: AtomicU64::new(0),
        }
    }

    fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::Acquire))
    }

    fn set_speed(&self, speed: f64) {
        self.speed_bits.store(speed.to_bits(), Ordering::Release);
    }

    fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

/// Plays one source on a background pacing thread.
///
/// Exactly one engine exists per open playback surface. The engine owns the
/// pacing thread (and through it the decode session); dropping the engine
/// closes it.
pub struct PlaybackEngine {
    url: String,
    controls: Arc<SharedControls>,
    native_frame_interval: Duration,
    worker: Option<JoinHandle<()>>,
}

impl Debug for PlaybackEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PlaybackEngine")
            .field("url", &self.url)
            .field("state", &self.state())
            .field("speed", &self.speed())
            .field("native_frame_interval", &self.native_frame_interval)
            .finish_non_exhaustive()
    }
}

impl PlaybackEngine {
    /// Open `url` and start playing it into `sink`.
    ///
    /// Blocks until the pacing thread has opened the decode session. The
    /// native frame interval is `1 / fps`, with
    /// [`PlaybackOptions::fallback_frames_per_second`] standing in for a
    /// source that reports no usable rate.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::SourceUnavailable`] (or whatever the opener
    /// reported) if the session cannot be opened. No thread is left running
    /// in that case.
    pub fn open<S: FrameSink + 'static>(
        url: &str,
        opener: Arc<dyn SessionOpener>,
        sink: S,
        options: &PlaybackOptions,
    ) -> Result<Self, ShelfError> {
        let controls = Arc::new(SharedControls::new());
        let (ready_sender, ready_receiver) = mpsc::channel::<Result<Duration, ShelfError>>();

        let worker_url = url.to_string();
        let worker_controls = Arc::clone(&controls);
        let fallback = options.fallback_frames_per_second;
        let pause_poll_interval = options.pause_poll_interval.max(MIN_PAUSE_POLL_INTERVAL);

        let worker = thread::Builder::new()
            .name("vidshelf-pacing".to_string())
            .spawn(move || {
                let session = match opener.open(&worker_url) {
                    Ok(session) => session,
                    Err(error) => {
                        let _ = ready_sender.send(Err(error));
                        return;
                    }
                };
                let frames_per_second =
                    crate::utilities::effective_frames_per_second(session.frame_rate(), fallback);
                let interval = Duration::from_secs_f64(1.0 / frames_per_second);
                if ready_sender.send(Ok(interval)).is_err() {
                    let mut session = session;
                    session.release();
                    return;
                }

                PacingLoop {
                    session,
                    sink,
                    controls: worker_controls,
                    native_frame_interval: interval,
                    pause_poll_interval,
                }
                .run();
            })?;

        let native_frame_interval = match ready_receiver.recv() {
            Ok(Ok(interval)) => interval,
            Ok(Err(error)) => {
                let _ = worker.join();
                return Err(error);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(ShelfError::SourceUnavailable {
                    url: url.to_string(),
                    reason: "pacing thread exited before opening the source".to_string(),
                });
            }
        };

        log::info!(
            "Playing {url} (frame interval {:.2} ms)",
            native_frame_interval.as_secs_f64() * 1000.0
        );

        Ok(Self {
            url: url.to_string(),
            controls,
            native_frame_interval,
            worker: Some(worker),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Flip between playing and paused.
    ///
    /// Only the flag changes here; the pacing thread notices on its next
    /// iteration.
    pub fn toggle_play_pause(&self) -> PlaybackState {
        if self.worker.is_none() {
            return PlaybackState::Stopped;
        }
        let was_playing = self.controls.playing.fetch_xor(true, Ordering::AcqRel);
        log::debug!("{} {}", if was_playing { "Paused" } else { "Resumed" }, self.url);
        self.state()
    }

    /// Add `delta` to the speed multiplier, never going below
    /// [`MIN_SPEED`]. There is no upper bound.
    ///
    /// Returns the new multiplier.
    pub fn change_speed(&self, delta: f64) -> f64 {
        let current = self.controls.speed();
        let candidate = current + delta;
        let speed = if candidate.is_finite() {
            candidate.max(MIN_SPEED)
        } else {
            current
        };
        self.controls.set_speed(speed);
        log::debug!("Speed for {} now {speed:.2}x", self.url);
        speed
    }

    /// Return to normal speed.
    pub fn reset_speed(&self) {
        self.controls.set_speed(1.0);
    }

    pub fn speed(&self) -> f64 {
        self.controls.speed()
    }

    /// Speed formatted the way the playback controls display it, e.g.
    /// `"1.25x"`.
    pub fn speed_label(&self) -> String {
        format!("{:.2}x", self.speed())
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        if self.worker.is_none() || self.controls.is_closing() {
            PlaybackState::Stopped
        } else if self.controls.playing.load(Ordering::Acquire) {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    /// The source's own per-frame interval, before speed scaling.
    pub fn frame_interval(&self) -> Duration {
        self.native_frame_interval
    }

    /// The delay the pacing loop currently waits after each frame.
    pub fn effective_frame_delay(&self) -> Duration {
        crate::utilities::paced_delay(self.native_frame_interval, self.speed())
    }

    /// Frames handed to the sink so far.
    pub fn frames_presented(&self) -> u64 {
        self.controls.frames_presented.load(Ordering::Acquire)
    }

    /// How many times playback wrapped from end of stream to the start.
    pub fn loops_completed(&self) -> u64 {
        self.controls.loops_completed.load(Ordering::Acquire)
    }

    /// Stop playback and release the decode session.
    ///
    /// Wakes the pacing thread if it is sleeping and waits for it to exit.
    /// The thread releases the session before exiting, so after this returns
    /// the session is never touched again. Calling `close` more than once is
    /// harmless.
    pub fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.controls.closing.store(true, Ordering::Release);
        worker.thread().unpark();
        if worker.join().is_err() {
            log::warn!("Pacing thread for {} panicked", self.url);
        }
        log::info!(
            "Closed {} after {} frame(s)",
            self.url,
            self.frames_presented()
        );
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}

/// State owned by the pacing thread.
struct PacingLoop<S> {
    session: Box<dyn DecodeSession>,
    sink: S,
    controls: Arc<SharedControls>,
    native_frame_interval: Duration,
    pause_poll_interval: Duration,
}

impl<S: FrameSink> PacingLoop<S> {
    fn run(mut self) {
        // Set after a rewind; cleared once a frame arrives. A source that
        // rewinds twice in a row without producing anything gets the pause
        // poll interval between attempts instead of a hot loop.
        let mut rewound_without_frame = false;

        while !self.controls.is_closing() {
            if !self.controls.playing.load(Ordering::Acquire) {
                self.sleep_unless_closed(self.pause_poll_interval);
                continue;
            }

            match self.session.next_frame() {
                Ok(Some(frame)) => {
                    rewound_without_frame = false;
                    let frame = frame.into_rgb();
                    if self.controls.is_closing() {
                        break;
                    }
                    self.sink.present(&frame);
                    self.controls.frames_presented.fetch_add(1, Ordering::AcqRel);

                    let delay =
                        crate::utilities::paced_delay(self.native_frame_interval, self.controls.speed());
                    self.sleep_unless_closed(delay);
                }
                Ok(None) => {
                    if !self.rewind_unless_closed(rewound_without_frame) {
                        break;
                    }
                    rewound_without_frame = true;
                }
                Err(error) => {
                    log::debug!("Transient frame read failure, rewinding: {error}");
                    if !self.rewind_unless_closed(rewound_without_frame) {
                        break;
                    }
                    rewound_without_frame = true;
                }
            }
        }

        self.session.release();
    }

    /// Rewind after end of stream or a failed read. Returns `false` without
    /// touching the session once closing has been requested, including while
    /// the read that led here was still blocked.
    fn rewind_unless_closed(&mut self, back_to_back: bool) -> bool {
        if back_to_back {
            self.sleep_unless_closed(self.pause_poll_interval);
        }
        if self.controls.is_closing() {
            return false;
        }
        self.rewind();
        true
    }

    fn rewind(&mut self) {
        match self.session.seek_to_start() {
            Ok(()) => {
                self.controls.loops_completed.fetch_add(1, Ordering::AcqRel);
            }
            Err(error) => log::warn!("Failed to rewind source: {error}"),
        }
    }

    /// Sleep for `duration`, returning early once closing is requested.
    fn sleep_unless_closed(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.controls.is_closing() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
