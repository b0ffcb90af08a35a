//! Effect channel scheduling
//!
//! Onsets are spread over a fixed bank of output channels (lamps, pixels,
//! colour components). Each onset goes to the channel that has been
//! resting longest; every channel then decays on its own.

use super::onset::Onset;

/// Per-backend channel constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelTuning {
    /// Refractory frames per unit of onset steepness
    pub refractory_scale: f32,
    /// Upper bound of the refractory counter
    pub refractory_max: i32,
    /// Channel value per unit of onset steepness
    pub value_scale: f32,
    /// Decay per frame as a fraction of the fired value
    pub decay_fraction: f32,
    /// Frames after firing before the one-time reset event
    pub settle_delay: i32,
}

impl Default for ChannelTuning {
    fn default() -> Self {
        Self {
            refractory_scale: 100.0,
            refractory_max: 255,
            value_scale: 4.0,
            decay_fraction: 1.0 / 40.0,
            settle_delay: 5,
        }
    }
}

/// State of one output channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    pub refractory: i32,
    /// Refractory value set by the last firing
    pub refractory_mark: i32,
    pub value: f32,
    pub decay_rate: f32,
    /// Set on firing, cleared once the reset event was emitted
    armed: bool,
}

impl ChannelState {
    pub fn is_refractory(&self) -> bool {
        self.refractory > 0
    }
}

/// Result of assigning an onset to a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFire {
    pub channel: usize,
    pub refractory: i32,
    pub value: f32,
    /// Onset steepness the channel was fired with
    pub strength: f32,
}

/// Fixed-size bank of independently decaying channels
#[derive(Debug, Clone)]
pub struct ChannelBank {
    tuning: ChannelTuning,
    channels: Vec<ChannelState>,
}

impl ChannelBank {
    pub fn new(count: usize, tuning: ChannelTuning) -> Self {
        Self {
            tuning,
            channels: vec![ChannelState::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn tuning(&self) -> &ChannelTuning {
        &self.tuning
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn values(&self) -> Vec<f32> {
        self.channels.iter().map(|c| c.value).collect()
    }

    /// The channel with the smallest refractory counter, lowest index on ties.
    pub fn candidate(&self) -> Option<usize> {
        self.channels
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.refractory)
            .map(|(i, _)| i)
    }

    /// Fire the candidate channel for `onset`, unless it is still refractory.
    pub fn assign(&mut self, onset: &Onset) -> Option<ChannelFire> {
        let index = self.candidate()?;
        let tuning = self.tuning;
        let channel = &mut self.channels[index];
        if channel.is_refractory() {
            return None;
        }

        let strength = onset.steepness.max(0.0);
        let refractory = ((strength * tuning.refractory_scale) as i32).clamp(0, tuning.refractory_max);

        channel.refractory = refractory;
        channel.refractory_mark = refractory;
        channel.value = strength * tuning.value_scale;
        channel.decay_rate = channel.value * tuning.decay_fraction;
        channel.armed = true;

        Some(ChannelFire {
            channel: index,
            refractory,
            value: channel.value,
            strength,
        })
    }

    /// Advance every channel one frame. Returns the channels that reached
    /// their settle point on this frame.
    pub fn tick(&mut self) -> Vec<usize> {
        let settle_delay = self.tuning.settle_delay;
        let mut resets = Vec::new();

        for (index, channel) in self.channels.iter_mut().enumerate() {
            if channel.armed && channel.refractory == channel.refractory_mark - settle_delay {
                channel.armed = false;
                resets.push(index);
            }

            channel.refractory = channel.refractory.saturating_sub(1);
            channel.value -= channel.decay_rate;
            if channel.value <= 0.0 {
                channel.value = 0.0;
                channel.decay_rate = 0.0;
            }
        }

        resets
    }

    /// True when no channel has a visible value left.
    pub fn is_dark(&self) -> bool {
        self.channels.iter().all(|c| c.value == 0.0)
    }

    pub fn reset(&mut self) {
        self.channels.fill(ChannelState::default());
    }
}
