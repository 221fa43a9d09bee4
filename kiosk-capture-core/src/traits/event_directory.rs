use crate::models::artifacts::DestinationId;

/// Supplies the destination the current session saves into.
pub trait EventDirectory: Send + Sync {
    fn current_destination(&self) -> Option<DestinationId>;
}
