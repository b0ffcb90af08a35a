//! Output backend lifecycle

/// Lifecycle every output backend implements.
///
/// The host calls `init` once, then any sequence of `start`, `play`,
/// `flush` and `stop`, and finally `deinit`. `play` receives interleaved
/// signed 16-bit stereo samples.
pub trait AudioOutput: Sized {
    type Config;
    type Error: std::error::Error + Send + Sync + 'static;

    fn init(config: Self::Config) -> Result<Self, Self::Error>;

    fn start(&mut self, sample_rate: u32);

    fn play(&mut self, samples: &[i16]);

    fn flush(&mut self);

    fn stop(&mut self);

    /// Output latency in frames, if the backend reports one.
    fn delay(&self) -> Option<u64> {
        None
    }

    fn deinit(self);
}
