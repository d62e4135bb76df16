/// Consumes published messages and updates derived state.
///
/// Handlers must be **idempotent**: they are fed at-least-once off the bus
/// and may also be re-run wholesale by a recompute sweep. A handler failure
/// is the handler's own problem — the bus and the originating write are never
/// affected by it.
pub trait EventHandler<M> {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, message: &M) -> Result<(), Self::Error>;
}
