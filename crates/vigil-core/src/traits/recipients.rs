use crate::alert::RecipientSelector;
use crate::error::Result;
use async_trait::async_trait;
use vigil_types::Recipient;

#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Expand a selector into concrete delivery targets, in a stable order.
    async fn resolve(&self, selector: &RecipientSelector) -> Result<Vec<Recipient>>;
}
