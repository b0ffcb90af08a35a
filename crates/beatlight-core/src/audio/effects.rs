//! Onset detection wired to the channel bank.

use super::channels::{ChannelBank, ChannelFire, ChannelTuning};
use super::onset::{Onset, OnsetDetector, OnsetTuning};
use super::spectrum::ExcitationSignal;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// What happened on one analysis frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectUpdate {
    pub onset: Option<Onset>,
    pub fired: Option<ChannelFire>,
    /// Channels that reached their settle point this frame
    pub resets: Vec<usize>,
}

/// Main envelope plus a channel bank shared with a render loop.
pub struct EffectEngine {
    detector: OnsetDetector,
    bank: Arc<Mutex<ChannelBank>>,
    frames: u64,
    onsets: u64,
}

impl EffectEngine {
    pub fn new(channels: usize, onset: OnsetTuning, channel: ChannelTuning) -> Self {
        Self {
            detector: OnsetDetector::new(onset),
            bank: Arc::new(Mutex::new(ChannelBank::new(channels, channel))),
            frames: 0,
            onsets: 0,
        }
    }

    /// Handle to the bank for readers on other threads.
    pub fn bank(&self) -> Arc<Mutex<ChannelBank>> {
        Arc::clone(&self.bank)
    }

    pub fn detector(&self) -> &OnsetDetector {
        &self.detector
    }

    pub fn onset_count(&self) -> u64 {
        self.onsets
    }

    /// Detect, assign and age the bank for one frame.
    pub fn process(&mut self, signal: ExcitationSignal) -> EffectUpdate {
        self.step(signal, true)
    }

    /// Detect and assign only. The bank is aged elsewhere, e.g. by a
    /// render loop running at its own rate.
    pub fn trigger(&mut self, signal: ExcitationSignal) -> EffectUpdate {
        self.step(signal, false)
    }

    fn step(&mut self, signal: ExcitationSignal, age_bank: bool) -> EffectUpdate {
        self.frames += 1;
        let onset = self.detector.process(signal);

        let mut bank = self.bank.lock();
        let fired = onset.as_ref().and_then(|o| bank.assign(o));
        let resets = if age_bank { bank.tick() } else { Vec::new() };
        drop(bank);

        if let Some(o) = &onset {
            self.onsets += 1;
            trace!(
                "Onset #{} at frame {}: level={:.3} steepness={:.3} channel={:?}",
                self.onsets,
                self.frames,
                o.level,
                o.steepness,
                fired.map(|f| f.channel)
            );
        }

        EffectUpdate {
            onset,
            fired,
            resets,
        }
    }

    pub fn reset(&mut self) {
        self.detector.reset();
        self.bank.lock().reset();
    }
}
