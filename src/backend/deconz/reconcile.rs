//! Write planning: desired port states vs. the cached light table.
//!
//! Planning is pure so it can be exercised without a gateway; issuing the
//! writes is the backend's job.

use crate::controller::PortMap;
use crate::registry::{DeviceRegistry, LightLookup};

/// One corrective `PUT /lights/{id}/state` to issue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LightWrite {
    pub light_id: String,
    pub on: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchFailure {
    Missing,
    Ambiguous,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct ReconcilePlan {
    pub writes: Vec<LightWrite>,
    pub unmatched: Vec<(String, MatchFailure)>,
}

/// Compute the minimal write set.
///
/// A write is planned only for a port name matching exactly one light whose
/// cached state is known and differs from the desired value. Lights with an
/// unknown state are left alone (their true state cannot be compared), and
/// the comparison is always against the cache, so an external change that
/// undid an earlier write gets corrected on the next pass while an
/// unchanged world plans nothing.
#[must_use]
pub fn plan_writes(desired: &PortMap, registry: &DeviceRegistry) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for (name, &want) in desired {
        match registry.light_by_name(name) {
            LightLookup::Unique(light) => {
                if light.on.is_some_and(|on| on != want) {
                    plan.writes.push(LightWrite {
                        light_id: light.id.clone(),
                        on: want,
                    });
                }
            }
            LightLookup::Missing => {
                plan.unmatched.push((name.clone(), MatchFailure::Missing));
            }
            LightLookup::Ambiguous => {
                plan.unmatched.push((name.clone(), MatchFailure::Ambiguous));
            }
        }
    }

    plan
}
