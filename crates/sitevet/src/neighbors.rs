//! Neighbor lookup: records within a radius of a focal record.

use crate::error::Result;
use crate::geo::distance_km;
use crate::record::{RecordId, RecordTable};

/// Default reviewer-facing search radius in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// A record found near the focal record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: RecordId,
    pub distance_km: f64,
}

/// Find every record within `radius_km` of the focal record, in canonical
/// table order.
///
/// The focal record itself and records without a location are excluded. A
/// focal record without a location has no neighbors.
///
/// This is a linear scan per query, which is fine for the interactive
/// dataset sizes this store holds (hundreds to low thousands of rows). If
/// the table outgrows that, a grid index keyed by rounded lat/lon can
/// replace the scan without changing this contract.
pub fn neighbors_within(
    table: &RecordTable,
    focal: RecordId,
    radius_km: f64,
) -> Result<Vec<Neighbor>> {
    let focal_record = table.get(focal)?;
    let Some(origin) = focal_record.location() else {
        return Ok(Vec::new());
    };

    let mut neighbors = Vec::new();
    for record in table.records() {
        if record.id() == focal {
            continue;
        }
        let Some(location) = record.location() else {
            continue;
        };
        let distance = distance_km(origin, location);
        if distance <= radius_km {
            neighbors.push(Neighbor {
                id: record.id(),
                distance_km: distance,
            });
        }
    }
    Ok(neighbors)
}
