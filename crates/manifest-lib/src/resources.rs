//! Resource request building
//!
//! Turns an app's memory, disk and CPU declarations into the resource list
//! used for both requests and limits, filling CPU from the space's runtime
//! defaults when the app leaves it out.

use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::models::{ResourceList, ResourceName, RuntimeDefaults};
use crate::quantity::{cf_to_si_units, div_ceil, Quantity, NANOS_PER_MILLI};

/// Bytes in one GiB, the unit the CPU-per-RAM ratio is expressed against
pub const BYTES_PER_GIB: i128 = 1 << 30;

/// Build the resource list for an app
///
/// Returns `Ok(None)` when nothing is declared and no default applies, so
/// callers can tell "no resources" apart from an empty list.
pub fn build_resource_requests(
    memory: &str,
    disk_quota: &str,
    cpu: &str,
    runtime: &RuntimeDefaults,
) -> Result<Option<ResourceList>> {
    let memory = parse_optional(memory, true)?;
    let disk = parse_optional(disk_quota, true)?;
    let explicit_cpu = parse_optional(cpu, false)?;

    let mut list = ResourceList::new();
    if let Some(memory) = memory {
        list.insert(ResourceName::Memory, memory);
    }
    if let Some(disk) = disk {
        list.insert(ResourceName::EphemeralStorage, disk);
    }
    if let Some(cpu) = resolve_cpu(explicit_cpu, memory, runtime) {
        list.insert(ResourceName::Cpu, cpu);
    }

    debug!(
        memory = ?list.get(&ResourceName::Memory).map(ToString::to_string),
        cpu = ?list.get(&ResourceName::Cpu).map(ToString::to_string),
        ephemeral_storage = ?list.get(&ResourceName::EphemeralStorage).map(ToString::to_string),
        "Built resource requests"
    );

    Ok((!list.is_empty()).then_some(list))
}

/// Parse a manifest quantity, skipping empty strings
///
/// Errors name the string as the user wrote it, before unit conversion.
fn parse_optional(raw: &str, cf_units: bool) -> Result<Option<Quantity>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let normalized = if cf_units {
        cf_to_si_units(raw)
    } else {
        raw.to_string()
    };
    Quantity::parse(&normalized)
        .map(Some)
        .map_err(|reason| ConversionError::QuantityParse {
            raw: raw.to_string(),
            reason,
        })
}

/// Pick the CPU value: explicit, then derived from RAM, then the floor
fn resolve_cpu(
    explicit: Option<Quantity>,
    memory: Option<Quantity>,
    runtime: &RuntimeDefaults,
) -> Option<Quantity> {
    let computed = explicit.or_else(|| {
        let ratio = runtime.app_cpu_per_gb_of_ram?;
        Some(cpu_for_memory(ratio, memory?))
    });

    match (computed, runtime.app_cpu_min) {
        (Some(cpu), Some(min)) if cpu < min => Some(min),
        (Some(cpu), _) => Some(cpu),
        (None, min) => min,
    }
}

/// CPU for an amount of memory at a per-GiB ratio, rounded up to milli-cores
///
/// The exact product is computed first so only the final value is rounded.
pub fn cpu_for_memory(ratio: Quantity, memory: Quantity) -> Quantity {
    let bytes = memory.value_ceil();
    let scale = BYTES_PER_GIB * NANOS_PER_MILLI;

    let millis = match ratio.nanos().checked_mul(bytes) {
        Some(product) => div_ceil(product, scale),
        None => div_ceil(ratio.nanos(), NANOS_PER_MILLI)
            .saturating_mul(div_ceil(bytes, BYTES_PER_GIB)),
    };
    Quantity::from_millis(millis)
}
