use crate::{
    domain::{
        Approver, ApproverId, ApproverPatch, ApproverRef, Card, CardId, CardPatch, CardStatus,
        NewApprover, NewCard, Stage,
    },
    error::{BoardError, Result},
    session::Session,
    storage::Storage,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    cards: Vec<Card>,
    approvers: Vec<Approver>,
    next_card_id: i64,
    next_approver_id: i64,
}

/// In-process backend with the same contract as the REST API.
///
/// Ids are sequential numbers and never reused. Approver ids sent with a
/// card are joined into full records, as the real backend does.
#[derive(Debug)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_card_id: 1,
                next_approver_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Snapshot of the stored cards, in insertion order
    pub async fn cards(&self) -> Vec<Card> {
        self.state.lock().await.cards.clone()
    }

    /// Inserts a card as-is, bypassing validation; useful to stage legacy data
    pub async fn insert_card(&self, card: Card) {
        self.state.lock().await.cards.push(card);
    }

    fn authorize(session: &Session) -> Result<()> {
        if session.is_authenticated() {
            Ok(())
        } else {
            Err(BoardError::Unauthorized)
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_cards(&self, session: &Session) -> Result<Vec<Card>> {
        Self::authorize(session)?;
        Ok(self.state.lock().await.cards.clone())
    }

    async fn list_cards_by_status(&self, session: &Session, stage: Stage) -> Result<Vec<Card>> {
        Self::authorize(session)?;
        let state = self.state.lock().await;
        Ok(state.cards.iter().filter(|c| c.is_in(stage)).cloned().collect())
    }

    async fn get_card(&self, session: &Session, id: &CardId) -> Result<Card> {
        Self::authorize(session)?;
        let state = self.state.lock().await;
        state
            .cards
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| BoardError::CardNotFound(id.to_string()))
    }

    async fn create_card(&self, session: &Session, card: &NewCard) -> Result<Card> {
        Self::authorize(session)?;
        card.validate()?;

        let mut state = self.state.lock().await;
        let id = CardId::from_number(state.next_card_id);
        state.next_card_id += 1;

        let created = Card {
            id,
            title: card.title.clone(),
            gmud_link: card.gmud_link.clone(),
            executor: card.executor.clone(),
            open_date: Some(card.open_date),
            execution_forecast: Some(card.execution_forecast),
            status: CardStatus::Stage(card.status()),
            approvers: card
                .approver_ids
                .iter()
                .map(|id| ApproverRef::Unresolved(id.clone()).resolve(&state.approvers))
                .collect(),
        };
        state.cards.push(created.clone());
        Ok(created)
    }

    async fn update_card(&self, session: &Session, id: &CardId, patch: &CardPatch) -> Result<Card> {
        Self::authorize(session)?;
        patch.validate()?;

        let mut state = self.state.lock().await;
        let State {
            cards, approvers, ..
        } = &mut *state;
        let card = cards
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| BoardError::CardNotFound(id.to_string()))?;
        patch.apply_to(card, approvers);
        Ok(card.clone())
    }

    async fn update_card_status(&self, session: &Session, id: &CardId, stage: Stage) -> Result<Card> {
        self.update_card(session, id, &CardPatch::status(stage)).await
    }

    async fn delete_card(&self, session: &Session, id: &CardId) -> Result<()> {
        Self::authorize(session)?;
        session.require_admin("Deleting cards")?;

        let mut state = self.state.lock().await;
        let before = state.cards.len();
        state.cards.retain(|c| &c.id != id);
        if state.cards.len() == before {
            return Err(BoardError::CardNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_approvers(&self, session: &Session) -> Result<Vec<Approver>> {
        Self::authorize(session)?;
        Ok(self.state.lock().await.approvers.clone())
    }

    async fn get_approver(&self, session: &Session, id: &ApproverId) -> Result<Approver> {
        Self::authorize(session)?;
        let state = self.state.lock().await;
        state
            .approvers
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| BoardError::ApproverNotFound(id.to_string()))
    }

    async fn create_approver(&self, session: &Session, approver: &NewApprover) -> Result<Approver> {
        Self::authorize(session)?;
        session.require_admin("Adding approvers")?;
        approver.validate()?;

        let mut state = self.state.lock().await;
        let id = ApproverId::from_number(state.next_approver_id);
        state.next_approver_id += 1;

        let created = Approver::new(id, approver.first_name.trim(), approver.last_name.trim());
        state.approvers.push(created.clone());
        Ok(created)
    }

    async fn update_approver(
        &self,
        session: &Session,
        id: &ApproverId,
        patch: &ApproverPatch,
    ) -> Result<Approver> {
        Self::authorize(session)?;
        session.require_admin("Editing approvers")?;
        patch.validate()?;

        let mut state = self.state.lock().await;
        let approver = state
            .approvers
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| BoardError::ApproverNotFound(id.to_string()))?;
        patch.apply_to(approver);
        Ok(approver.clone())
    }

    async fn delete_approver(&self, session: &Session, id: &ApproverId) -> Result<()> {
        Self::authorize(session)?;
        session.require_admin("Removing approvers")?;

        let mut state = self.state.lock().await;
        let before = state.approvers.len();
        state.approvers.retain(|a| &a.id != id);
        if state.approvers.len() == before {
            return Err(BoardError::ApproverNotFound(id.to_string()));
        }
        Ok(())
    }
}
