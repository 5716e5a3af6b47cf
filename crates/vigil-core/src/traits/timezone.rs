use async_trait::async_trait;
use chrono_tz::Tz;

/// Resolves the local zone an entity keeps its calendar in.
///
/// The trigger-hour gate and the entity's "today" are both read in this zone.
#[async_trait]
pub trait TimezoneOracle: Send + Sync {
    async fn zone_of(&self, entity_id: &str) -> Tz;
}
