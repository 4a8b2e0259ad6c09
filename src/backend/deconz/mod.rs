mod client;
mod reconcile;
mod websocket;

pub use client::DeconzClient;
pub use reconcile::{LightWrite, MatchFailure, ReconcilePlan, plan_writes};
pub use websocket::DeconzWs;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep};

use deconz::event::{EventKind, PushEvent, ResourceKind};

use crate::config::DeconzServer;
use crate::controller::{BridgeHandles, OutboundEvent, PortMap};
use crate::error::{ApiError, ApiResult};
use crate::registry::DeviceRegistry;
use crate::service::Service;

const RETRY_DELAY_MIN: Duration = Duration::from_secs(1);
const RETRY_DELAY_MAX: Duration = Duration::from_secs(60);

/// The hub side of the bridge.
///
/// Owns the REST client, the push-event stream and the device registry, and
/// turns controller port changes into corrective light writes and sensor
/// presses into controller events. Connection loss degrades to
/// last-known-good state; every reconnect re-runs websocket-port discovery
/// and re-seeds both snapshots, since pushes missed while disconnected are
/// gone for good.
pub struct DeconzBackend {
    server: DeconzServer,
    client: DeconzClient,
    registry: Arc<Mutex<DeviceRegistry>>,
    handles: BridgeHandles,
    ws: Option<DeconzWs>,
    retry_delay: Duration,
    warned_ports: HashSet<String>,
}

impl DeconzBackend {
    pub fn new(
        server: DeconzServer,
        registry: Arc<Mutex<DeviceRegistry>>,
        handles: BridgeHandles,
    ) -> ApiResult<Self> {
        Ok(Self {
            client: DeconzClient::new(&server)?,
            server,
            registry,
            handles,
            ws: None,
            retry_delay: RETRY_DELAY_MIN,
            warned_ports: HashSet::new(),
        })
    }

    /// Full (re)connect cycle: discover the websocket port, open the
    /// stream, re-seed the registry, then surface the connected status.
    async fn connect(&mut self, desired: &PortMap) -> ApiResult<()> {
        let gateway = self.client.get_gateway_config().await?;
        let url = deconz::websocket_url(&self.server.host, gateway.websocketport);
        self.ws = Some(DeconzWs::connect(&url).await?);

        if let Err(err) = self.reseed(desired).await {
            self.ws = None;
            return Err(err);
        }

        self.handles.connected.send_replace(true);
        self.retry_delay = RETRY_DELAY_MIN;
        log::info!("Hub connected, push stream at {url}");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.ws = None;
        self.handles.connected.send_replace(false);
    }

    /// Replace both registry tables with fresh snapshots and reconcile
    /// against the new light table.
    async fn reseed(&mut self, desired: &PortMap) -> ApiResult<()> {
        let lights = self.client.get_lights().await?;
        let sensors = self.client.get_sensors().await?;

        {
            let mut registry = self.registry.lock().await;
            registry.apply_light_snapshot(lights);
            registry.apply_sensor_snapshot(sensors);
        }

        self.reconcile(desired).await;
        Ok(())
    }

    /// Compare desired port states against the cache and issue the delta.
    /// A failed write is logged and abandoned; the next refresh of that
    /// light re-plans it.
    async fn reconcile(&mut self, desired: &PortMap) {
        let plan = {
            let registry = self.registry.lock().await;
            reconcile::plan_writes(desired, &registry)
        };

        for (name, failure) in plan.unmatched {
            if self.warned_ports.insert(name.clone()) {
                match failure {
                    MatchFailure::Missing => {
                        log::warn!("No hub light is named {name:?}, port ignored");
                    }
                    MatchFailure::Ambiguous => {
                        log::warn!("Several hub lights are named {name:?}, port ignored");
                    }
                }
            }
        }

        for write in plan.writes {
            log::info!(
                "Switching light {} {}",
                write.light_id,
                if write.on { "on" } else { "off" }
            );
            if let Err(err) = self.client.set_light_on(&write.light_id, write.on).await {
                log::error!("Light write abandoned: {err}");
            }
        }
    }

    async fn handle_push_event(&mut self, event: PushEvent, desired: &PortMap) {
        match (event.e, event.r) {
            (EventKind::Changed, ResourceKind::Lights) => {
                // Light push payloads are shallow and unreliable for the
                // switch state; one REST read is authoritative.
                match self.client.get_light(&event.id).await {
                    Ok(light) => {
                        self.registry
                            .lock()
                            .await
                            .apply_light_refresh(&event.id, light);
                        self.reconcile(desired).await;
                    }
                    Err(err) => log::error!("Light {} refresh failed: {err}", event.id),
                }
            }
            (EventKind::Changed, ResourceKind::Sensors) => {
                self.handle_sensor_change(&event).await;
            }
            _ => {}
        }
    }

    async fn handle_sensor_change(&mut self, event: &PushEvent) {
        let attr_name = event.attr.as_ref().and_then(|attr| attr.name.as_deref());

        let mut registry = self.registry.lock().await;

        let name = match attr_name {
            Some(name) => name.to_string(),
            None => match registry.sensor_name(&event.id) {
                Some(name) => name.to_string(),
                None => {
                    log::error!("{}", ApiError::UnresolvedSensorName(event.id.clone()));
                    return;
                }
            },
        };

        let Some(record) = registry.apply_sensor_update(
            &event.id,
            attr_name,
            event.state.as_ref(),
            event.config.as_ref(),
        ) else {
            // Push events never create records; wait for a snapshot.
            return;
        };

        // Only a state-bearing frame with a fresh gesture code may forward;
        // anything else must not re-fire the previously cached press.
        let pressed = event
            .state
            .as_ref()
            .and_then(|state| state.buttonevent)
            .and(record.state.buttonevent);
        drop(registry);

        if let Some(value) = self.server.press_format.decode(pressed) {
            log::debug!("Forwarding {value:?} for sensor {name:?}");
            let _ = self.handles.events.send(OutboundEvent { name, value });
        }
    }

    async fn event_loop(&mut self, ports: &mut watch::Receiver<PortMap>) -> ApiResult<()> {
        let mut resync = self.server.poll_interval_secs.map(|secs| {
            let period = Duration::from_secs(u64::from(secs.get()));
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tick
        });

        loop {
            if let Some(ws) = &mut self.ws {
                tokio::select! {
                    changed = ports.changed() => {
                        changed?;
                        let desired = ports.borrow_and_update().clone();
                        self.reconcile(&desired).await;
                    }
                    () = maybe_tick(&mut resync) => {
                        let desired = ports.borrow().clone();
                        if let Err(err) = self.reseed(&desired).await {
                            log::error!("Periodic resync failed: {err}");
                        }
                    }
                    event = ws.next_event() => match event {
                        Ok(Some(event)) => {
                            let desired = ports.borrow().clone();
                            self.handle_push_event(event, &desired).await;
                        }
                        Ok(None) => {
                            log::warn!("Push stream closed by the hub");
                            self.disconnect();
                        }
                        Err(err) => {
                            log::warn!("Push stream failed: {err}");
                            self.disconnect();
                        }
                    },
                }
            } else {
                tokio::select! {
                    changed = ports.changed() => {
                        changed?;
                        let desired = ports.borrow_and_update().clone();
                        self.reconcile(&desired).await;
                    }
                    () = sleep(self.retry_delay) => {
                        let desired = ports.borrow().clone();
                        if let Err(err) = self.connect(&desired).await {
                            log::warn!(
                                "Hub connect failed (retrying in {:?}): {err}",
                                self.retry_delay
                            );
                            self.retry_delay = (self.retry_delay * 2).min(RETRY_DELAY_MAX);
                        }
                    }
                }
            }
        }
    }
}

async fn maybe_tick(resync: &mut Option<Interval>) {
    match resync {
        Some(tick) => {
            tick.tick().await;
        }
        None => future::pending().await,
    }
}

#[async_trait]
impl Service for DeconzBackend {
    type Error = ApiError;

    async fn start(&mut self) -> ApiResult<()> {
        log::info!(
            "deCONZ backend ready ({}:{})",
            self.server.host,
            self.server.port
        );
        Ok(())
    }

    async fn run(&mut self) -> ApiResult<()> {
        let mut ports = self.handles.ports.clone();

        let desired = ports.borrow_and_update().clone();
        if let Err(err) = self.connect(&desired).await {
            log::warn!("Initial hub connect failed: {err}");
        }

        self.event_loop(&mut ports).await
    }
}
