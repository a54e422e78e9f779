use crate::{
    domain::{
        Approver, ApproverId, ApproverPatch, Card, CardId, CardPatch, NewApprover, NewCard, Stage,
    },
    error::Result,
    session::Session,
};
use async_trait::async_trait;

pub mod memory_storage;
pub mod rest_storage;
pub mod snapshot;

pub use memory_storage::MemoryStorage;
pub use rest_storage::RestStorage;
pub use snapshot::SnapshotStore;

/// Backend persisting cards and approvers.
///
/// Every call carries the caller's session. Mutations return the backend's
/// post-update record, which is the only thing callers may write into
/// their local state.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Lists every card
    async fn list_cards(&self, session: &Session) -> Result<Vec<Card>>;

    /// Lists cards currently in `stage`
    async fn list_cards_by_status(&self, session: &Session, stage: Stage) -> Result<Vec<Card>>;

    /// Loads a card by ID
    async fn get_card(&self, session: &Session, id: &CardId) -> Result<Card>;

    /// Creates a card and returns it with its assigned id
    async fn create_card(&self, session: &Session, card: &NewCard) -> Result<Card>;

    /// Applies a partial update and returns the updated card
    async fn update_card(&self, session: &Session, id: &CardId, patch: &CardPatch) -> Result<Card>;

    /// Moves a card to another stage and returns the updated card
    async fn update_card_status(&self, session: &Session, id: &CardId, stage: Stage) -> Result<Card>;

    /// Deletes a card
    async fn delete_card(&self, session: &Session, id: &CardId) -> Result<()>;

    /// Lists every approver
    async fn list_approvers(&self, session: &Session) -> Result<Vec<Approver>>;

    /// Loads an approver by ID
    async fn get_approver(&self, session: &Session, id: &ApproverId) -> Result<Approver>;

    /// Registers an approver
    async fn create_approver(&self, session: &Session, approver: &NewApprover) -> Result<Approver>;

    /// Renames an approver
    async fn update_approver(
        &self,
        session: &Session,
        id: &ApproverId,
        patch: &ApproverPatch,
    ) -> Result<Approver>;

    /// Removes an approver
    async fn delete_approver(&self, session: &Session, id: &ApproverId) -> Result<()>;
}
