use std::collections::HashMap;

use itertools::Itertools;

use deconz::api::{Light, Sensor, SensorConfig, SensorState};

/// What the bridge currently believes about one hub light.
///
/// `on` is `None` until the hub has confirmed a real state; such lights are
/// invisible to reconciliation. The record only ever reflects completed REST
/// reads, never writes the bridge itself issued.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LightRecord {
    pub id: String,
    pub name: String,
    pub on: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SensorRecord {
    pub id: String,
    pub name: String,
    pub battery: Option<u8>,
    pub state: SensorState,
}

/// Result of resolving a desired-state name against the light table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LightLookup<'a> {
    Unique(&'a LightRecord),
    Missing,
    Ambiguous,
}

/// In-memory mirror of the hub's lights and sensors.
///
/// Records are created by snapshots only; push notifications may update
/// existing records but never invent one. Both tables live for the process
/// lifetime and are sized by the hub's device count.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    lights: HashMap<String, LightRecord>,
    sensors: HashMap<String, SensorRecord>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire light table with a fresh `GET /lights` snapshot.
    pub fn apply_light_snapshot(&mut self, lights: HashMap<String, Light>) {
        self.lights = lights
            .into_iter()
            .map(|(id, light)| {
                let record = LightRecord {
                    id: id.clone(),
                    name: light.name,
                    on: light.state.on,
                };
                (id, record)
            })
            .collect();
        log::debug!("Light snapshot applied ({} lights)", self.lights.len());
    }

    /// Replace a single light record with a fresh `GET /lights/{id}` read.
    /// Push payloads for lights are unreliable; the fetched record wins
    /// wholesale.
    pub fn apply_light_refresh(&mut self, id: &str, light: Light) {
        let record = LightRecord {
            id: id.to_string(),
            name: light.name,
            on: light.state.on,
        };
        self.lights.insert(id.to_string(), record);
    }

    /// Replace the entire sensor table with a fresh `GET /sensors` snapshot.
    pub fn apply_sensor_snapshot(&mut self, sensors: HashMap<String, Sensor>) {
        self.sensors = sensors
            .into_iter()
            .map(|(id, sensor)| {
                let record = SensorRecord {
                    id: id.clone(),
                    name: sensor.name,
                    battery: sensor.config.battery,
                    state: sensor.state,
                };
                (id, record)
            })
            .collect();
        log::debug!("Sensor snapshot applied ({} sensors)", self.sensors.len());
    }

    /// Merge a push notification into an existing sensor record: only fields
    /// present in the notification replace cached values. Unknown ids are a
    /// no-op and return `None`.
    pub fn apply_sensor_update(
        &mut self,
        id: &str,
        attr_name: Option<&str>,
        state: Option<&SensorState>,
        config: Option<&SensorConfig>,
    ) -> Option<&SensorRecord> {
        let record = self.sensors.get_mut(id)?;

        if let Some(name) = attr_name {
            record.name = name.to_string();
        }
        if let Some(state) = state {
            if state.buttonevent.is_some() {
                record.state.buttonevent = state.buttonevent;
            }
            if state.lastupdated.is_some() {
                record.state.lastupdated = state.lastupdated;
            }
        }
        if let Some(config) = config {
            if config.battery.is_some() {
                record.battery = config.battery;
            }
        }

        Some(record)
    }

    #[must_use]
    pub fn sensor_name(&self, id: &str) -> Option<&str> {
        self.sensors.get(id).map(|sensor| sensor.name.as_str())
    }

    #[must_use]
    pub fn sensor(&self, id: &str) -> Option<&SensorRecord> {
        self.sensors.get(id)
    }

    /// Resolve a light by display name. Names are the join key between the
    /// controller's ports and the hub's devices, so anything other than
    /// exactly one match is reported as such instead of picking a winner.
    #[must_use]
    pub fn light_by_name(&self, name: &str) -> LightLookup<'_> {
        let matches = self
            .lights
            .values()
            .filter(|light| light.name == name)
            .take(2)
            .collect_vec();

        match matches.as_slice() {
            [light] => LightLookup::Unique(light),
            [] => LightLookup::Missing,
            _ => LightLookup::Ambiguous,
        }
    }

    #[must_use]
    pub fn light(&self, id: &str) -> Option<&LightRecord> {
        self.lights.get(id)
    }

    #[must_use]
    pub const fn lights(&self) -> &HashMap<String, LightRecord> {
        &self.lights
    }

    #[must_use]
    pub const fn sensors(&self) -> &HashMap<String, SensorRecord> {
        &self.sensors
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;

    use deconz::api::LightState;

    use super::*;

    fn hall_switch() -> Sensor {
        Sensor {
            name: "Hall".to_string(),
            config: SensorConfig {
                battery: Some(80),
                reachable: Some(true),
            },
            state: SensorState {
                buttonevent: Some(1002),
                lastupdated: None,
            },
            ..Sensor::default()
        }
    }

    fn seeded() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        registry.apply_sensor_snapshot(hashmap! {"2".to_string() => hall_switch()});
        registry
    }

    #[test]
    fn partial_update_preserves_untouched_fields() {
        let mut registry = seeded();

        let update = SensorState {
            buttonevent: Some(2002),
            lastupdated: None,
        };
        registry
            .apply_sensor_update("2", None, Some(&update), None)
            .unwrap();

        let sensor = registry.sensor("2").unwrap();
        assert_eq!(sensor.name, "Hall");
        assert_eq!(sensor.battery, Some(80));
        assert_eq!(sensor.state.buttonevent, Some(2002));
    }

    #[test]
    fn config_only_update_keeps_button_state() {
        let mut registry = seeded();

        let config = SensorConfig {
            battery: Some(55),
            reachable: None,
        };
        registry
            .apply_sensor_update("2", None, None, Some(&config))
            .unwrap();

        let sensor = registry.sensor("2").unwrap();
        assert_eq!(sensor.battery, Some(55));
        assert_eq!(sensor.state.buttonevent, Some(1002));
    }

    #[test]
    fn update_for_unknown_id_is_a_no_op() {
        let mut registry = seeded();

        let update = SensorState {
            buttonevent: Some(2002),
            lastupdated: None,
        };
        assert!(
            registry
                .apply_sensor_update("99", Some("Ghost"), Some(&update), None)
                .is_none()
        );
        assert_eq!(registry.sensors().len(), 1);
        assert!(registry.sensor("99").is_none());
    }

    #[test]
    fn attr_name_renames_a_known_sensor() {
        let mut registry = seeded();

        registry.apply_sensor_update("2", Some("Hallway"), None, None);
        assert_eq!(registry.sensor_name("2"), Some("Hallway"));
    }

    #[test]
    fn light_refresh_replaces_the_whole_record() {
        let mut registry = DeviceRegistry::new();
        registry.apply_light_snapshot(hashmap! {
            "1".to_string() => Light {
                name: "Lamp".to_string(),
                state: LightState { on: Some(false), reachable: Some(true) },
                ..Light::default()
            },
        });

        registry.apply_light_refresh(
            "1",
            Light {
                name: "Desk lamp".to_string(),
                state: LightState {
                    on: Some(true),
                    reachable: Some(true),
                },
                ..Light::default()
            },
        );

        let light = registry.light("1").unwrap();
        assert_eq!(light.name, "Desk lamp");
        assert_eq!(light.on, Some(true));
    }

    #[test]
    fn name_lookup_distinguishes_missing_from_ambiguous() {
        let mut registry = DeviceRegistry::new();
        registry.apply_light_snapshot(hashmap! {
            "1".to_string() => Light { name: "Lamp".to_string(), ..Light::default() },
            "2".to_string() => Light { name: "Spot".to_string(), ..Light::default() },
            "3".to_string() => Light { name: "Spot".to_string(), ..Light::default() },
        });

        assert!(matches!(
            registry.light_by_name("Lamp"),
            LightLookup::Unique(light) if light.id == "1"
        ));
        assert_eq!(registry.light_by_name("Sconce"), LightLookup::Missing);
        assert_eq!(registry.light_by_name("Spot"), LightLookup::Ambiguous);
    }

    #[test]
    fn snapshot_replaces_previous_table() {
        let mut registry = DeviceRegistry::new();
        registry.apply_light_snapshot(hashmap! {
            "1".to_string() => Light { name: "Lamp".to_string(), ..Light::default() },
        });
        registry.apply_light_snapshot(hashmap! {
            "2".to_string() => Light { name: "Spot".to_string(), ..Light::default() },
        });

        assert!(registry.light("1").is_none());
        assert!(registry.light("2").is_some());
    }
}
