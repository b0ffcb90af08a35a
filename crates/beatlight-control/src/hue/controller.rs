use super::client::HueClient;
use super::error::HueError;
use super::models::{HueConfig, LightState};
use beatlight_core::{LampLevel, LampSink, Rgb, SinkError};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

const QUEUE_DEPTH: usize = 256;

#[derive(Debug)]
enum Message {
    Put { lamp: u32, state: LightState },
    Shutdown,
}

/// Lamp sink handed to the audio flow. Requests are queued and never block.
#[derive(Clone)]
pub struct HueLamps {
    lamps: Vec<u32>,
    sender: mpsc::Sender<Message>,
}

impl HueLamps {
    pub fn lamps(&self) -> &[u32] {
        &self.lamps
    }

    /// Queue `state` for the lamp behind `channel`.
    pub fn send(&self, channel: usize, state: LightState) -> Result<(), SinkError> {
        let lamp = *self
            .lamps
            .get(channel)
            .ok_or(SinkError::ChannelOutOfRange {
                channel,
                count: self.lamps.len(),
            })?;

        self.sender
            .try_send(Message::Put { lamp, state })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    SinkError::Rejected(format!("request queue full, lamp {} skipped", lamp))
                }
                mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
            })
    }

    /// Same state to every lamp.
    pub fn broadcast(&self, state: impl Fn(usize) -> LightState) -> Result<(), SinkError> {
        for channel in 0..self.lamps.len() {
            self.send(channel, state(channel))?;
        }
        Ok(())
    }
}

impl LampSink for HueLamps {
    fn set_level(&mut self, channel: usize, level: LampLevel) -> Result<(), SinkError> {
        self.send(channel, LightState::level(level))
    }

    fn set_color(&mut self, channel: usize, color: Rgb) -> Result<(), SinkError> {
        self.send(channel, LightState::color(color))
    }
}

/// Owns the runtime that carries the bridge requests.
pub struct HueController {
    runtime: Runtime,
    lamps: HueLamps,
    dispatch: Option<JoinHandle<()>>,
}

impl HueController {
    pub fn new(config: &HueConfig) -> Result<Self, HueError> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("hue-http")
            .enable_all()
            .build()?;

        let client = HueClient::new(config)?;
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        let dispatch = runtime.spawn(run_dispatch_loop(client, receiver));

        info!(
            "Hue controller ready: bridge {}, lamps {:?}",
            config.bridge_ip, config.lamps
        );

        Ok(Self {
            runtime,
            lamps: HueLamps {
                lamps: config.lamps.clone(),
                sender,
            },
            dispatch: Some(dispatch),
        })
    }

    /// A new handle on the lamps.
    pub fn lamps(&self) -> HueLamps {
        self.lamps.clone()
    }

    /// Let queued requests finish, waiting at most `timeout`.
    pub fn shutdown(mut self, timeout: Duration) {
        let Some(dispatch) = self.dispatch.take() else {
            return;
        };

        let sender = self.lamps.sender.clone();
        let finished = self.runtime.block_on(async move {
            if sender.send(Message::Shutdown).await.is_err() {
                debug!("Hue dispatch loop already stopped");
            }
            tokio::time::timeout(timeout, dispatch).await.is_ok()
        });

        if !finished {
            warn!("Hue requests still pending after {:?}, dropping", timeout);
        }
        self.runtime.shutdown_timeout(Duration::from_millis(100));
        info!("Hue controller stopped");
    }
}

/// Issues each queued request as its own task; ends on `Shutdown` or when
/// every sender is gone, after the in-flight requests completed.
async fn run_dispatch_loop(client: HueClient, mut receiver: mpsc::Receiver<Message>) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            msg = receiver.recv() => match msg {
                Some(Message::Put { lamp, state }) => {
                    let client = client.clone();
                    in_flight.spawn(async move {
                        if let Err(e) = client.put_state(lamp, &state).await {
                            warn!("Hue request for lamp {} failed: {}", lamp, e);
                        }
                    });
                }
                Some(Message::Shutdown) | None => break,
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    while in_flight.join_next().await.is_some() {}
}
