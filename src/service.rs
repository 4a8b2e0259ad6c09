use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

/// A long-running task with a setup step and a main loop.
///
/// `run` is expected to block for the life of the service; returning (with
/// or without an error) hands control back to the supervisor.
#[async_trait]
pub trait Service: Send + 'static {
    type Error: std::fmt::Display + Send;

    async fn start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn run(&mut self) -> Result<(), Self::Error>;
}

const RESTART_DELAY_MIN: Duration = Duration::from_secs(1);
const RESTART_DELAY_MAX: Duration = Duration::from_secs(60);

/// Run a service forever, restarting it with exponential backoff when it
/// fails or returns. A run that survived for a while resets the backoff, so
/// a flapping dependency does not escalate the delay indefinitely.
pub async fn supervise<S: Service>(name: &'static str, mut svc: S) {
    let mut delay = RESTART_DELAY_MIN;

    if let Err(err) = svc.start().await {
        log::error!("[{name}] start failed: {err}");
    }

    loop {
        let started = Instant::now();

        match svc.run().await {
            Ok(()) => log::warn!("[{name}] service exited, restarting"),
            Err(err) => log::error!("[{name}] service failed: {err}"),
        }

        if started.elapsed() >= RESTART_DELAY_MAX {
            delay = RESTART_DELAY_MIN;
        }

        log::info!("[{name}] restarting in {delay:?}");
        sleep(delay).await;
        delay = (delay * 2).min(RESTART_DELAY_MAX);
    }
}

/// Spawn a supervised service onto the runtime.
pub fn spawn<S: Service>(name: &'static str, svc: S) -> JoinHandle<()> {
    tokio::spawn(supervise(name, svc))
}
