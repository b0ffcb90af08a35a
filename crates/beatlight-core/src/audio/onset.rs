//! Onset detection on the excitation signal
//!
//! An onset fires on a sudden *rise* of the sub-band standard deviation
//! rather than on loudness, so sustained energy does not retrigger. A fired
//! onset holds the main envelope for a few frames and then decays linearly.

use super::spectrum::ExcitationSignal;

/// Per-backend onset constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetTuning {
    /// Minimum frame-to-frame rise of the standard deviation
    pub steepness_threshold: f32,
    /// Decay per frame as a fraction of the triggering level
    pub decay_fraction: f32,
    /// Frames during which no new onset may fire
    pub refractory_frames: i32,
    /// Zero the decay rate once the envelope reaches zero
    pub reset_decay_at_zero: bool,
}

impl Default for OnsetTuning {
    fn default() -> Self {
        Self {
            steepness_threshold: 0.05,
            decay_fraction: 1.0 / 40.0,
            refractory_frames: 5,
            reset_decay_at_zero: true,
        }
    }
}

/// A detected onset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onset {
    /// Standard deviation that fired the onset
    pub level: f32,
    /// Rise of the standard deviation over the previous frame
    pub steepness: f32,
}

/// Linearly decaying envelope with a refractory counter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeState {
    pub previous: f32,
    pub value: f32,
    pub decay_rate: f32,
    pub refractory: i32,
}

impl EnvelopeState {
    pub fn is_refractory(&self) -> bool {
        self.refractory > 0
    }

    /// Advance one frame: count down and decay, clamping at zero.
    pub fn age(&mut self, reset_decay_at_zero: bool) {
        self.refractory = self.refractory.saturating_sub(1);
        self.value -= self.decay_rate;
        if self.value <= 0.0 {
            self.value = 0.0;
            if reset_decay_at_zero {
                self.decay_rate = 0.0;
            }
        }
    }

    /// Start a new decay from `value`.
    pub fn trigger(&mut self, value: f32, decay_fraction: f32, refractory: i32) {
        self.value = value.max(0.0);
        self.decay_rate = self.value * decay_fraction;
        self.refractory = refractory;
    }
}

/// Main envelope follower deciding when onsets fire
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    tuning: OnsetTuning,
    envelope: EnvelopeState,
}

impl OnsetDetector {
    pub fn new(tuning: OnsetTuning) -> Self {
        Self {
            tuning,
            envelope: EnvelopeState::default(),
        }
    }

    pub fn tuning(&self) -> &OnsetTuning {
        &self.tuning
    }

    pub fn envelope(&self) -> &EnvelopeState {
        &self.envelope
    }

    /// Feed one frame of excitation. The envelope is aged first, so the
    /// state observed after a firing frame is exactly the triggered one.
    pub fn process(&mut self, signal: ExcitationSignal) -> Option<Onset> {
        let sigma = signal.std_dev;
        self.envelope.age(self.tuning.reset_decay_at_zero);

        let steepness = sigma - self.envelope.previous;
        let fired = steepness > self.tuning.steepness_threshold
            && sigma > self.envelope.value
            && !self.envelope.is_refractory();

        if fired {
            self.envelope.trigger(
                sigma,
                self.tuning.decay_fraction,
                self.tuning.refractory_frames,
            );
        }

        self.envelope.previous = sigma;

        fired.then_some(Onset {
            level: sigma,
            steepness,
        })
    }

    pub fn reset(&mut self) {
        self.envelope = EnvelopeState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(std_dev: f32) -> ExcitationSignal {
        ExcitationSignal {
            mean: 0.0,
            std_dev,
        }
    }

    #[test]
    fn test_silence_never_fires() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        for _ in 0..100 {
            assert!(detector.process(signal(0.0)).is_none());
        }
        assert_eq!(detector.envelope().value, 0.0);
    }

    #[test]
    fn test_step_fires_and_sets_envelope() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        assert!(detector.process(signal(0.10)).is_some());

        // Let the refractory window and the decay run out
        for _ in 0..50 {
            detector.process(signal(0.10));
        }
        assert!(detector.envelope().value < 0.20);

        let onset = detector.process(signal(0.20)).expect("onset");
        assert!((onset.level - 0.20).abs() < 1e-6);
        assert!((onset.steepness - 0.10).abs() < 1e-6);

        let envelope = detector.envelope();
        assert!((envelope.value - 0.20).abs() < 1e-6);
        assert!((envelope.decay_rate - 0.005).abs() < 1e-6);
        assert_eq!(envelope.refractory, 5);
    }

    #[test]
    fn test_sustained_level_does_not_retrigger() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        assert!(detector.process(signal(0.5)).is_some());
        for _ in 0..200 {
            assert!(detector.process(signal(0.5)).is_none());
        }
    }

    #[test]
    fn test_small_rise_is_ignored() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        detector.process(signal(0.10));
        for _ in 0..50 {
            detector.process(signal(0.10));
        }
        assert!(detector.process(signal(0.14)).is_none());
    }

    #[test]
    fn test_refractory_blocks_second_onset() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        assert!(detector.process(signal(0.2)).is_some());
        detector.process(signal(0.0));
        // Rise is steep and above the envelope, but still refractory
        assert!(detector.process(signal(0.3)).is_none());
        assert!(detector.envelope().is_refractory());
    }

    #[test]
    fn test_refractory_expires_after_configured_frames() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        assert!(detector.process(signal(0.2)).is_some());
        for _ in 0..4 {
            detector.process(signal(0.0));
        }
        assert_eq!(detector.envelope().refractory, 1);
        // Fifth frame after the onset ages the counter to zero
        assert!(detector.process(signal(0.3)).is_some());
    }

    #[test]
    fn test_envelope_decays_to_zero_and_clamps() {
        let mut detector = OnsetDetector::new(OnsetTuning::default());
        detector.process(signal(0.4));

        let mut last = detector.envelope().value;
        for _ in 0..45 {
            detector.process(signal(0.0));
            let value = detector.envelope().value;
            assert!(value <= last);
            assert!(value >= 0.0);
            last = value;
        }
        assert_eq!(last, 0.0);
        assert_eq!(detector.envelope().decay_rate, 0.0);
    }

    #[test]
    fn test_decay_rate_kept_when_not_reset_at_zero() {
        let mut envelope = EnvelopeState::default();
        envelope.trigger(0.1, 0.5, 0);
        envelope.age(false);
        envelope.age(false);
        envelope.age(false);
        assert_eq!(envelope.value, 0.0);
        assert!(envelope.decay_rate > 0.0);
    }
}
