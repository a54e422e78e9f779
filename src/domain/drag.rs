use crate::domain::{
    board::Stage,
    card::{Card, CardId},
};

/// A drop that needs persisting: move `card_id` into `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub card_id: CardId,
    pub target: Stage,
}

/// Tracks the card currently lifted by a drag gesture.
///
/// Gestures are sequential; the input layer does not start a new one while
/// another is active. Every exit path leaves the session idle.
#[derive(Debug, Default)]
pub struct DragSession {
    active: Option<CardId>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Card being dragged, for rendering the floating preview
    pub fn active(&self) -> Option<&CardId> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, card_id: CardId) {
        if let Some(stale) = self.active.replace(card_id) {
            tracing::debug!(card_id = %stale, "Discarding stale drag session");
        }
    }

    /// Ends the gesture. Returns the lifted card and the drop target when
    /// there is something for the resolver to look at.
    pub fn end(&mut self, drop_target: Option<&str>) -> Option<(CardId, String)> {
        let source = self.active.take()?;
        match drop_target {
            Some(target) => Some((source, target.to_string())),
            None => {
                tracing::debug!(card_id = %source, "Drag released outside any drop zone");
                None
            }
        }
    }

    /// Aborts the gesture without a drop
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

/// Decides what dropping `source` onto `drop_target` means.
///
/// A column id targets that stage; a card id targets the stage that card is
/// in. Dropping onto a card never reorders, it only changes status. Returns
/// `None` when nothing needs to happen: source gone, target unknown, or the
/// card already has the target status (which covers dropping onto itself).
pub fn resolve_drop(cards: &[Card], source: &CardId, drop_target: &str) -> Option<Stage> {
    let source_card = cards.iter().find(|card| &card.id == source)?;

    let target = Stage::from_id(drop_target).or_else(|| {
        cards
            .iter()
            .find(|card| card.id.as_str() == drop_target)
            .and_then(Card::stage)
    })?;

    if source_card.is_in(target) {
        return None;
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{CardStatus, ExecutionTeam};

    fn card(id: &str, status: &str) -> Card {
        Card {
            id: CardId::new(id),
            title: format!("GMUD {id}"),
            gmud_link: String::new(),
            executor: ExecutionTeam::Data,
            open_date: None,
            execution_forecast: None,
            status: CardStatus::from(status.to_string()),
            approvers: Vec::new(),
        }
    }

    fn board() -> Vec<Card> {
        vec![
            card("a", "aberta"),
            card("b", "pendente-aprovacao-1"),
            card("c", "concluido"),
            card("x", "arquivada"),
        ]
    }

    #[test]
    fn test_drop_on_card_takes_its_status() {
        let cards = board();
        assert_eq!(
            resolve_drop(&cards, &CardId::new("a"), "b"),
            Some(Stage::PendingApproval1)
        );
    }

    #[test]
    fn test_drop_on_column_takes_column_stage() {
        let cards = board();
        assert_eq!(resolve_drop(&cards, &CardId::new("a"), "concluido"), Some(Stage::Done));
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let cards = board();
        for c in &cards {
            assert_eq!(resolve_drop(&cards, &c.id, c.id.as_str()), None);
        }
    }

    #[test]
    fn test_drop_on_same_column_is_noop() {
        let cards = board();
        assert_eq!(resolve_drop(&cards, &CardId::new("a"), "aberta"), None);
    }

    #[test]
    fn test_unknown_target_is_noop() {
        let cards = board();
        assert_eq!(resolve_drop(&cards, &CardId::new("a"), "nowhere"), None);
        assert_eq!(resolve_drop(&cards, &CardId::new("a"), "x"), None);
    }

    #[test]
    fn test_missing_source_is_noop() {
        let cards = board();
        assert_eq!(resolve_drop(&cards, &CardId::new("gone"), "concluido"), None);
    }

    #[test]
    fn test_unknown_status_card_can_be_rescued_into_a_column() {
        let cards = board();
        assert_eq!(resolve_drop(&cards, &CardId::new("x"), "aberta"), Some(Stage::Open));
    }

    #[test]
    fn test_session_hands_off_on_drop() {
        let mut session = DragSession::new();
        session.start(CardId::new("a"));
        assert_eq!(session.active(), Some(&CardId::new("a")));

        let handoff = session.end(Some("b"));
        assert_eq!(handoff, Some((CardId::new("a"), "b".to_string())));
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_clears_on_every_exit() {
        let mut session = DragSession::new();

        session.start(CardId::new("a"));
        assert_eq!(session.end(None), None);
        assert!(!session.is_active());

        session.start(CardId::new("a"));
        session.cancel();
        assert!(!session.is_active());

        assert_eq!(session.end(Some("b")), None, "no gesture in progress");
    }

    #[test]
    fn test_stale_session_is_replaced() {
        let mut session = DragSession::new();
        session.start(CardId::new("a"));
        session.start(CardId::new("b"));
        assert_eq!(session.active(), Some(&CardId::new("b")));
    }
}
