//! Sample buffering and real-time pacing
//!
//! The host delivers interleaved stereo samples in bursts of arbitrary
//! length. [`SamplePacer`] accumulates them into a fixed-size
//! [`AnalysisFrame`], hands every completed frame to the caller and then
//! holds the calling thread back until the wall clock has caught up with
//! the amount of audio consumed so far.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Number of stereo sample pairs in one analysis window.
pub const FRAME_SIZE: usize = 1024;

/// Whether the pacer sleeps to stay in step with real playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Sleep after each frame until the playback deadline is reached
    #[default]
    RealTime,
    /// Never sleep (offline analysis and tests)
    Unpaced,
}

/// One analysis window of interleaved `[L, R, L, R, ...]` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFrame {
    samples: Vec<i16>,
}

impl AnalysisFrame {
    /// Create a silent frame holding `frame_size` stereo pairs.
    pub fn new(frame_size: usize) -> Self {
        Self {
            samples: vec![0; frame_size * 2],
        }
    }

    /// Build a frame from already interleaved samples.
    ///
    /// Returns `None` for an empty or odd-length slice.
    pub fn from_interleaved(samples: &[i16]) -> Option<Self> {
        if samples.is_empty() || samples.len() % 2 != 0 {
            return None;
        }
        Some(Self {
            samples: samples.to_vec(),
        })
    }

    /// Number of stereo sample pairs.
    pub fn frame_size(&self) -> usize {
        self.samples.len() / 2
    }

    /// Raw interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn left(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples.iter().step_by(2).copied()
    }

    pub fn right(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples.iter().skip(1).step_by(2).copied()
    }

    fn clear(&mut self) {
        self.samples.fill(0);
    }
}

/// Frame accumulator with playback-rate pacing.
pub struct SamplePacer {
    frame: AnalysisFrame,
    fill: usize,
    sample_rate: u32,
    mode: PacingMode,
    /// Reference clock, set on the first push after start/flush
    started_at: Option<Instant>,
    /// Stereo pairs handed to analysis since the reference clock was set
    frames_played: u64,
}

impl SamplePacer {
    pub fn new(frame_size: usize, mode: PacingMode) -> Self {
        Self {
            frame: AnalysisFrame::new(frame_size),
            fill: 0,
            sample_rate: 0,
            mode,
            started_at: None,
            frames_played: 0,
        }
    }

    /// Reset the reference clock and play counters for a new stream.
    pub fn start(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.started_at = None;
        self.frames_played = 0;
        debug!("Pacer started at {} Hz ({:?})", sample_rate, self.mode);
    }

    /// Drop buffered samples and counters without analysing the partial frame.
    pub fn flush(&mut self) {
        self.fill = 0;
        self.frame.clear();
        self.started_at = None;
        self.frames_played = 0;
        debug!("Pacer flushed");
    }

    /// Interleaved samples currently buffered.
    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Interleaved capacity of the analysis frame (`2 * frame_size`).
    pub fn capacity(&self) -> usize {
        self.frame.samples.len()
    }

    /// Stereo pairs consumed since the reference clock was set.
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    pub fn mode(&self) -> PacingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PacingMode) {
        self.mode = mode;
    }

    /// Append samples, calling `on_frame` synchronously for every completed
    /// frame. Returns the number of frames completed by this call.
    pub fn push<F>(&mut self, samples: &[i16], mut on_frame: F) -> usize
    where
        F: FnMut(&AnalysisFrame),
    {
        if samples.is_empty() {
            return 0;
        }

        self.started_at.get_or_insert_with(Instant::now);

        let capacity = self.capacity();
        let mut rest = samples;
        let mut completed = 0;

        while !rest.is_empty() {
            let take = (capacity - self.fill).min(rest.len());
            self.frame.samples[self.fill..self.fill + take].copy_from_slice(&rest[..take]);
            self.fill += take;
            rest = &rest[take..];

            if self.fill == capacity {
                on_frame(&self.frame);
                self.fill = 0;
                self.frames_played += self.frame.frame_size() as u64;
                completed += 1;

                if let Some(wait) = self.time_until_deadline(Instant::now()) {
                    if self.mode == PacingMode::RealTime {
                        trace!("Pacer sleeping {:?}", wait);
                        std::thread::sleep(wait);
                    }
                }
            }
        }

        completed
    }

    /// Wall-clock instant at which the audio consumed so far finishes playing.
    pub fn deadline(&self) -> Option<Instant> {
        let started_at = self.started_at?;
        if self.sample_rate == 0 {
            return None;
        }
        let micros = self.frames_played * 1_000_000 / u64::from(self.sample_rate);
        Some(started_at + Duration::from_micros(micros))
    }

    /// How long the caller must wait at `now` to stay in real time.
    pub fn time_until_deadline(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .and_then(|deadline| deadline.checked_duration_since(now))
            .filter(|wait| !wait.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| i as i16).collect()
    }

    #[test]
    fn test_short_pushes_accumulate() {
        let mut pacer = SamplePacer::new(8, PacingMode::Unpaced);
        pacer.start(44100);

        let mut frames = Vec::new();
        assert_eq!(pacer.push(&ramp(10), |f| frames.push(f.clone())), 0);
        assert_eq!(pacer.fill(), 10);
        assert_eq!(pacer.push(&ramp(6), |f| frames.push(f.clone())), 1);
        assert_eq!(pacer.fill(), 0);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples()[..10], ramp(10)[..]);
        assert_eq!(frames[0].samples()[10..], ramp(6)[..]);
    }

    #[test]
    fn test_large_burst_yields_multiple_frames() {
        let mut pacer = SamplePacer::new(4, PacingMode::Unpaced);
        pacer.start(48000);

        let mut count = 0;
        let completed = pacer.push(&ramp(8 * 3 + 5), |_| count += 1);
        assert_eq!(completed, 3);
        assert_eq!(count, 3);
        assert_eq!(pacer.fill(), 5);
        assert_eq!(pacer.frames_played(), 12);
    }

    #[test]
    fn test_flush_discards_partial_frame() {
        let mut pacer = SamplePacer::new(4, PacingMode::Unpaced);
        pacer.start(44100);
        pacer.push(&ramp(8 + 3), |_| {});
        assert_eq!(pacer.frames_played(), 4);

        pacer.flush();
        assert_eq!(pacer.fill(), 0);
        assert_eq!(pacer.frames_played(), 0);
        assert!(pacer.deadline().is_none());

        let mut called = false;
        pacer.push(&ramp(7), |_| called = true);
        assert!(!called, "partial frame must not be analysed after flush");
    }

    #[test]
    fn test_deadline_tracks_consumed_audio() {
        let mut pacer = SamplePacer::new(1000, PacingMode::Unpaced);
        pacer.start(1000);
        pacer.push(&vec![0; 2000], |_| {});

        let start = pacer.started_at.unwrap();
        assert_eq!(pacer.deadline(), Some(start + Duration::from_secs(1)));

        let wait = pacer.time_until_deadline(start).unwrap();
        assert_eq!(wait, Duration::from_secs(1));
        assert!(pacer
            .time_until_deadline(start + Duration::from_secs(2))
            .is_none());
    }

    #[test]
    fn test_realtime_mode_sleeps_until_deadline() {
        // 64 pairs at 6400 Hz = 10ms per frame
        let mut pacer = SamplePacer::new(64, PacingMode::RealTime);
        pacer.start(6400);

        let begin = Instant::now();
        pacer.push(&vec![0; 128 * 3], |_| {});
        assert!(begin.elapsed() >= Duration::from_millis(29));
    }

    #[test]
    fn test_no_pacing_before_start() {
        let mut pacer = SamplePacer::new(4, PacingMode::RealTime);
        pacer.push(&ramp(16), |_| {});
        assert!(pacer.deadline().is_none());
    }

    #[test]
    fn test_channel_views() {
        let frame = AnalysisFrame::from_interleaved(&[1, -1, 2, -2, 3, -3]).unwrap();
        assert_eq!(frame.frame_size(), 3);
        assert_eq!(frame.left().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(frame.right().collect::<Vec<_>>(), vec![-1, -2, -3]);
        assert!(AnalysisFrame::from_interleaved(&[1, 2, 3]).is_none());
    }
}
