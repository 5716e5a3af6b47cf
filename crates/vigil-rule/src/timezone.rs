use async_trait::async_trait;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::debug;
use vigil_core::{AlertDataSource, TimezoneOracle};

/// Reads each entity's IANA zone from its metadata, falling back to a default zone.
pub struct EntityTimezoneOracle {
    source: Arc<dyn AlertDataSource>,
    default_zone: Tz,
}

impl EntityTimezoneOracle {
    pub fn new(source: Arc<dyn AlertDataSource>, default_zone: Tz) -> Self {
        Self {
            source,
            default_zone,
        }
    }
}

#[async_trait]
impl TimezoneOracle for EntityTimezoneOracle {
    async fn zone_of(&self, entity_id: &str) -> Tz {
        match self.source.entity_info(entity_id).await {
            Ok(info) => match info.timezone.as_deref().map(str::parse::<Tz>) {
                Some(Ok(zone)) => zone,
                Some(Err(e)) => {
                    debug!(entity_id = %entity_id, error = %e, "Unknown entity time zone, using default");
                    self.default_zone
                }
                None => self.default_zone,
            },
            Err(e) => {
                debug!(entity_id = %entity_id, error = %e, "Entity lookup failed, using default zone");
                self.default_zone
            }
        }
    }
}
