//! In-memory collections backing the board view.
//!
//! Both stores are owned by the sync coordinator and only change when a
//! backend response arrives.

use crate::domain::{Approver, ApproverId, Card, CardId};
use chrono::NaiveDate;

/// Cards in backend order
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Vec<Card>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Replaces the whole collection, e.g. after a list fetch
    pub fn replace_all(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }

    /// Replaces the card with the same id in place, or appends it
    pub fn upsert(&mut self, card: Card) {
        match self.cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
    }

    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        let pos = self.cards.iter().position(|c| &c.id == id)?;
        Some(self.cards.remove(pos))
    }

    /// Resolves bare approver tokens on every card against `directory`
    pub fn resolve_approvers(&mut self, directory: &[Approver]) {
        for card in &mut self.cards {
            card.resolve_approvers(directory);
        }
    }

    pub fn overdue_count_on(&self, today: NaiveDate) -> usize {
        self.cards.iter().filter(|c| c.is_overdue_on(today)).count()
    }
}

/// Approver directory
#[derive(Debug, Clone, Default)]
pub struct ApproverStore {
    approvers: Vec<Approver>,
}

impl ApproverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approvers(&self) -> &[Approver] {
        &self.approvers
    }

    pub fn get(&self, id: &ApproverId) -> Option<&Approver> {
        self.approvers.iter().find(|a| &a.id == id)
    }

    pub fn replace_all(&mut self, approvers: Vec<Approver>) {
        self.approvers = approvers;
    }

    pub fn upsert(&mut self, approver: Approver) {
        match self.approvers.iter_mut().find(|a| a.id == approver.id) {
            Some(existing) => *existing = approver,
            None => self.approvers.push(approver),
        }
    }

    pub fn remove(&mut self, id: &ApproverId) -> Option<Approver> {
        let pos = self.approvers.iter().position(|a| &a.id == id)?;
        Some(self.approvers.remove(pos))
    }

    /// Full names, in directory order; these are the approver filter options
    pub fn names(&self) -> Vec<String> {
        self.approvers.iter().map(Approver::full_name).collect()
    }

    /// Maps selected display names back to ids, dropping names not in the directory
    pub fn ids_for_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<ApproverId> {
        names
            .iter()
            .filter_map(|name| {
                self.approvers
                    .iter()
                    .find(|a| a.full_name() == name.as_ref())
                    .map(|a| a.id.clone())
            })
            .collect()
    }
}
