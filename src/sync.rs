//! Persistence of board mutations.
//!
//! Every mutation calls the backend first and only then writes the
//! backend's response into the local stores. A failed call leaves the
//! stores exactly as they were; the failure is logged and returned, never
//! retried.

use crate::{
    domain::{
        Approver, ApproverId, ApproverPatch, ApproverRef, Card, CardId, CardPatch, NewApprover,
        NewCard, Stage,
    },
    error::{BoardError, Result},
    session::Session,
    storage::{SnapshotStore, Storage},
    store::{ApproverStore, CardStore},
};
use std::sync::Arc;

/// Where the current card list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSource {
    Remote,
    Snapshot,
}

pub struct SyncCoordinator {
    storage: Arc<dyn Storage>,
    session: Session,
    cards: CardStore,
    approvers: ApproverStore,
    snapshot: Option<SnapshotStore>,
}

impl SyncCoordinator {
    pub fn new(storage: Arc<dyn Storage>, session: Session) -> Self {
        Self {
            storage,
            session,
            cards: CardStore::new(),
            approvers: ApproverStore::new(),
            snapshot: None,
        }
    }

    /// Mirrors the card list into `snapshot` and falls back to it on load failure
    pub fn with_snapshot(mut self, snapshot: SnapshotStore) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    pub fn approvers(&self) -> &ApproverStore {
        &self.approvers
    }

    /// Loads approvers, then cards. An approver failure does not block the
    /// card load; cards then keep their raw approver tokens.
    pub async fn load(&mut self) -> Result<CardSource> {
        if let Err(e) = self.load_approvers().await {
            if e.requires_logout() {
                return Err(e);
            }
        }
        self.load_cards().await
    }

    pub async fn load_cards(&mut self) -> Result<CardSource> {
        match self.storage.list_cards(&self.session).await {
            Ok(cards) => {
                tracing::info!(count = cards.len(), "Loaded cards");
                self.cards.replace_all(cards);
                self.cards.resolve_approvers(self.approvers.approvers());
                self.mirror().await;
                Ok(CardSource::Remote)
            }
            Err(e) if e.requires_logout() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load cards");
                let Some(snapshot) = &self.snapshot else {
                    return Err(e);
                };
                match snapshot.load().await {
                    Ok(cards) => {
                        tracing::warn!(count = cards.len(), "Using card snapshot");
                        self.cards.replace_all(cards);
                        self.cards.resolve_approvers(self.approvers.approvers());
                        Ok(CardSource::Snapshot)
                    }
                    Err(snapshot_err) => {
                        tracing::error!(error = %snapshot_err, "Card snapshot unreadable");
                        Err(e)
                    }
                }
            }
        }
    }

    pub async fn load_approvers(&mut self) -> Result<()> {
        let approvers = self
            .storage
            .list_approvers(&self.session)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to load approvers"))?;
        tracing::debug!(count = approvers.len(), "Loaded approvers");
        self.approvers.replace_all(approvers);
        self.cards.resolve_approvers(self.approvers.approvers());
        Ok(())
    }

    pub async fn create_card(&mut self, card: NewCard) -> Result<Card> {
        card.validate()?;
        let created = self
            .storage
            .create_card(&self.session, &card)
            .await
            .inspect_err(|e| tracing::error!(error = %e, title = %card.title, "Failed to create card"))?;

        tracing::info!(card_id = %created.id, "Created card");
        Ok(self.reconcile(created).await)
    }

    /// Edits card fields; a status change here follows the same path as a drag
    pub async fn update_card(&mut self, id: &CardId, patch: CardPatch) -> Result<Card> {
        patch.validate()?;
        if patch.is_empty() {
            return self
                .cards
                .get(id)
                .cloned()
                .ok_or_else(|| BoardError::CardNotFound(id.to_string()));
        }

        let updated = self
            .storage
            .update_card(&self.session, id, &patch)
            .await
            .inspect_err(|e| tracing::error!(card_id = %id, error = %e, "Failed to update card"))?;

        tracing::info!(card_id = %id, "Updated card");
        Ok(self.reconcile(updated).await)
    }

    /// Persists a status change and adopts the backend's record
    pub async fn apply_transition(&mut self, id: &CardId, stage: Stage) -> Result<Card> {
        let updated = self
            .storage
            .update_card_status(&self.session, id, stage)
            .await
            .inspect_err(|e| {
                tracing::error!(card_id = %id, status = %stage, error = %e, "Failed to move card")
            })?;

        tracing::info!(card_id = %id, status = %stage, "Moved card");
        Ok(self.reconcile(updated).await)
    }

    pub async fn delete_card(&mut self, id: &CardId) -> Result<()> {
        self.session.require_admin("Deleting cards")?;
        self.storage
            .delete_card(&self.session, id)
            .await
            .inspect_err(|e| tracing::error!(card_id = %id, error = %e, "Failed to delete card"))?;

        self.cards.remove(id);
        tracing::info!(card_id = %id, "Deleted card");
        self.mirror().await;
        Ok(())
    }

    /// Deletes every card one at a time. Cards deleted before a failure stay
    /// deleted; the first failure stops the run.
    pub async fn clear_all(&mut self) -> Result<()> {
        self.session.require_admin("Clearing the board")?;

        let ids: Vec<CardId> = self.cards.cards().iter().map(|c| c.id.clone()).collect();
        for id in &ids {
            if let Err(e) = self.storage.delete_card(&self.session, id).await {
                tracing::error!(card_id = %id, error = %e, "Failed to clear cards");
                self.mirror().await;
                return Err(e);
            }
            self.cards.remove(id);
        }

        tracing::info!(count = ids.len(), "Cleared board");
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.clear().await {
                tracing::warn!(error = %e, "Failed to clear card snapshot");
            }
        }
        Ok(())
    }

    pub async fn add_approver(&mut self, approver: NewApprover) -> Result<Approver> {
        self.session.require_admin("Adding approvers")?;
        approver.validate()?;
        let created = self
            .storage
            .create_approver(&self.session, &approver)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to add approver"))?;

        tracing::info!(approver_id = %created.id, "Added approver");
        self.approvers.upsert(created.clone());
        self.cards.resolve_approvers(self.approvers.approvers());
        Ok(created)
    }

    pub async fn update_approver(&mut self, id: &ApproverId, patch: ApproverPatch) -> Result<Approver> {
        self.session.require_admin("Editing approvers")?;
        patch.validate()?;
        let updated = self
            .storage
            .update_approver(&self.session, id, &patch)
            .await
            .inspect_err(|e| tracing::error!(approver_id = %id, error = %e, "Failed to update approver"))?;

        tracing::info!(approver_id = %id, "Updated approver");
        self.approvers.upsert(updated.clone());
        self.refresh_approver_on_cards(&updated);
        Ok(updated)
    }

    pub async fn delete_approver(&mut self, id: &ApproverId) -> Result<()> {
        self.session.require_admin("Removing approvers")?;
        self.storage
            .delete_approver(&self.session, id)
            .await
            .inspect_err(|e| tracing::error!(approver_id = %id, error = %e, "Failed to remove approver"))?;

        tracing::info!(approver_id = %id, "Removed approver");
        self.approvers.remove(id);
        Ok(())
    }

    /// Writes a backend record into the card store
    async fn reconcile(&mut self, mut card: Card) -> Card {
        card.resolve_approvers(self.approvers.approvers());
        self.cards.upsert(card.clone());
        self.mirror().await;
        card
    }

    fn refresh_approver_on_cards(&mut self, approver: &Approver) {
        let mut cards = self.cards.cards().to_vec();
        let mut changed = false;
        for card in &mut cards {
            for reference in &mut card.approvers {
                if let ApproverRef::Resolved(existing) = reference {
                    if existing.id == approver.id && existing != approver {
                        *existing = approver.clone();
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.cards.replace_all(cards);
        }
    }

    async fn mirror(&self) {
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(self.cards.cards()).await {
                tracing::warn!(error = %e, path = %snapshot.path().display(), "Failed to mirror card snapshot");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{id::WireId, ExecutionTeam};
    use crate::session::{User, UserType};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Wraps a backend and fails every call while `offline` is set
    pub(crate) struct FlakyStorage {
        pub inner: MemoryStorage,
        pub offline: AtomicBool,
    }

    impl FlakyStorage {
        pub fn new() -> Self {
            Self {
                inner: MemoryStorage::new(),
                offline: AtomicBool::new(false),
            }
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.offline.load(Ordering::SeqCst) {
                Err(BoardError::ApiError {
                    status: 503,
                    body: "backend unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn list_cards(&self, s: &Session) -> Result<Vec<Card>> {
            self.check()?;
            self.inner.list_cards(s).await
        }
        async fn list_cards_by_status(&self, s: &Session, stage: Stage) -> Result<Vec<Card>> {
            self.check()?;
            self.inner.list_cards_by_status(s, stage).await
        }
        async fn get_card(&self, s: &Session, id: &CardId) -> Result<Card> {
            self.check()?;
            self.inner.get_card(s, id).await
        }
        async fn create_card(&self, s: &Session, card: &NewCard) -> Result<Card> {
            self.check()?;
            self.inner.create_card(s, card).await
        }
        async fn update_card(&self, s: &Session, id: &CardId, patch: &CardPatch) -> Result<Card> {
            self.check()?;
            self.inner.update_card(s, id, patch).await
        }
        async fn update_card_status(&self, s: &Session, id: &CardId, stage: Stage) -> Result<Card> {
            self.check()?;
            self.inner.update_card_status(s, id, stage).await
        }
        async fn delete_card(&self, s: &Session, id: &CardId) -> Result<()> {
            self.check()?;
            self.inner.delete_card(s, id).await
        }
        async fn list_approvers(&self, s: &Session) -> Result<Vec<Approver>> {
            self.check()?;
            self.inner.list_approvers(s).await
        }
        async fn get_approver(&self, s: &Session, id: &ApproverId) -> Result<Approver> {
            self.check()?;
            self.inner.get_approver(s, id).await
        }
        async fn create_approver(&self, s: &Session, a: &NewApprover) -> Result<Approver> {
            self.check()?;
            self.inner.create_approver(s, a).await
        }
        async fn update_approver(
            &self,
            s: &Session,
            id: &ApproverId,
            patch: &ApproverPatch,
        ) -> Result<Approver> {
            self.check()?;
            self.inner.update_approver(s, id, patch).await
        }
        async fn delete_approver(&self, s: &Session, id: &ApproverId) -> Result<()> {
            self.check()?;
            self.inner.delete_approver(s, id).await
        }
    }

    pub(crate) fn session(user_type: UserType) -> Session {
        Session::new(
            "test-token",
            User {
                id: WireId::number(1),
                username: "ops".to_string(),
                email: None,
                user_type,
            },
        )
    }

    pub(crate) fn new_card(title: &str, approver_ids: Vec<ApproverId>) -> NewCard {
        NewCard::new(
            title,
            "https://gmud.example.com/1",
            ExecutionTeam::DevOps,
            Utc::now(),
            Utc::now(),
            approver_ids,
        )
    }

    async fn seeded(user_type: UserType) -> (Arc<FlakyStorage>, SyncCoordinator) {
        let storage = Arc::new(FlakyStorage::new());
        let mut sync = SyncCoordinator::new(storage.clone(), session(UserType::Admin));
        let jane = sync.add_approver(NewApprover::new("Jane", "Doe")).await.unwrap();
        sync.create_card(new_card("GMUD-001", vec![jane.id.clone()])).await.unwrap();
        sync.create_card(new_card("GMUD-002", vec![jane.id])).await.unwrap();

        let mut sync = SyncCoordinator::new(storage.clone(), session(user_type));
        sync.load().await.unwrap();
        (storage, sync)
    }

    #[tokio::test]
    async fn test_load_resolves_approvers() {
        let (_, sync) = seeded(UserType::User).await;
        assert_eq!(sync.cards().len(), 2);
        assert_eq!(sync.cards().cards()[0].approver_names(), vec!["Jane Doe".to_string()]);
        assert_eq!(sync.approvers().names(), vec!["Jane Doe".to_string()]);
    }

    #[tokio::test]
    async fn test_legacy_card_loads_without_a_column() {
        let (storage, mut sync) = seeded(UserType::User).await;
        let legacy: Card = serde_json::from_value(serde_json::json!({
            "id": 99, "title": "Legacy", "gmudLink": null, "status": null, "approvers": null,
        }))
        .unwrap();
        storage.inner.insert_card(legacy).await;

        assert_eq!(sync.load().await.unwrap(), CardSource::Remote);
        assert_eq!(sync.cards().len(), 3);
        let legacy = sync.cards().get(&CardId::from_number(99)).unwrap();
        assert_eq!(legacy.stage(), None);
        let shown: usize = Stage::ALL
            .iter()
            .map(|stage| sync.cards().cards().iter().filter(|c| c.is_in(*stage)).count())
            .sum();
        assert_eq!(shown, 2);
    }

    #[tokio::test]
    async fn test_transition_adopts_server_record() {
        let (_, mut sync) = seeded(UserType::User).await;
        let id = sync.cards().cards()[0].id.clone();

        let moved = sync.apply_transition(&id, Stage::PendingApproval1).await.unwrap();
        assert_eq!(moved.stage(), Some(Stage::PendingApproval1));
        assert_eq!(sync.cards().get(&id).unwrap().stage(), Some(Stage::PendingApproval1));
        assert_eq!(sync.cards().cards()[0].id, id, "position is kept");
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_store_untouched() {
        let (storage, mut sync) = seeded(UserType::User).await;
        let id = sync.cards().cards()[0].id.clone();
        let before = serde_json::to_vec(sync.cards().cards()).unwrap();

        storage.set_offline(true);
        let err = sync.apply_transition(&id, Stage::Done).await.unwrap_err();
        assert!(matches!(err, BoardError::ApiError { status: 503, .. }));

        let after = serde_json::to_vec(sync.cards().cards()).unwrap();
        assert_eq!(before, after);

        storage.set_offline(false);
        assert!(sync.apply_transition(&id, Stage::Done).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_create_and_edit_leave_store_untouched() {
        let (storage, mut sync) = seeded(UserType::User).await;
        let id = sync.cards().cards()[1].id.clone();
        storage.set_offline(true);

        assert!(sync.create_card(new_card("GMUD-003", vec![ApproverId::new("1")])).await.is_err());
        let patch = CardPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(sync.update_card(&id, patch).await.is_err());

        assert_eq!(sync.cards().len(), 2);
        assert_eq!(sync.cards().get(&id).unwrap().title, "GMUD-002");
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_backend() {
        let (storage, mut sync) = seeded(UserType::User).await;
        storage.set_offline(true);

        let mut invalid = new_card("GMUD-003", vec![ApproverId::new("1")]);
        invalid.gmud_link = "not a link".to_string();
        let err = sync.create_card(invalid).await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_delete_or_clear() {
        let (storage, mut sync) = seeded(UserType::User).await;
        let id = sync.cards().cards()[0].id.clone();

        assert!(matches!(sync.delete_card(&id).await, Err(BoardError::Forbidden(_))));
        assert!(matches!(sync.clear_all().await, Err(BoardError::Forbidden(_))));
        assert_eq!(storage.inner.cards().await.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_all_removes_everything() {
        let (storage, mut sync) = seeded(UserType::Admin).await;
        sync.clear_all().await.unwrap();
        assert!(sync.cards().is_empty());
        assert!(storage.inner.cards().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_falls_back_to_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = SnapshotStore::new(temp_dir.path().join("cards.json"));

        let storage = Arc::new(FlakyStorage::new());
        let mut sync = SyncCoordinator::new(storage.clone(), session(UserType::Admin))
            .with_snapshot(snapshot.clone());
        sync.create_card(new_card("GMUD-001", vec![ApproverId::new("1")])).await.unwrap();
        assert_eq!(snapshot.load().await.unwrap().len(), 1);

        storage.set_offline(true);
        let mut offline = SyncCoordinator::new(storage.clone(), session(UserType::User))
            .with_snapshot(snapshot);
        assert_eq!(offline.load().await.unwrap(), CardSource::Snapshot);
        assert_eq!(offline.cards().cards()[0].title, "GMUD-001");
    }

    #[tokio::test]
    async fn test_load_without_snapshot_propagates_error() {
        let storage = Arc::new(FlakyStorage::new());
        storage.set_offline(true);
        let mut sync = SyncCoordinator::new(storage, session(UserType::User));
        assert!(sync.load().await.is_err());
        assert!(sync.cards().is_empty());
    }

    #[tokio::test]
    async fn test_approver_rename_reaches_cards() {
        let (_, mut sync) = seeded(UserType::Admin).await;
        let jane = sync.approvers().approvers()[0].id.clone();

        sync.update_approver(
            &jane,
            ApproverPatch {
                last_name: Some("Smith".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        for card in sync.cards().cards() {
            assert_eq!(card.approver_names(), vec!["Jane Smith".to_string()]);
        }
    }

    #[tokio::test]
    async fn test_delete_approver() {
        let (storage, mut sync) = seeded(UserType::Admin).await;
        let jane = sync.approvers().approvers()[0].id.clone();

        storage.set_offline(true);
        assert!(sync.delete_approver(&jane).await.is_err());
        assert!(sync.approvers().get(&jane).is_some());

        storage.set_offline(false);
        sync.delete_approver(&jane).await.unwrap();
        assert!(sync.approvers().get(&jane).is_none());
    }
}
