use crate::{
    domain::{
        classify, dates, resolve_drop, BoardConfig, Card, CardId, Column, DragSession,
        ExecutionTeam, FilterState, Stage, Transition,
    },
    error::Result,
    sync::{CardSource, SyncCoordinator},
};
use chrono::NaiveDate;

/// A column ready to render: its static config plus the visible cards
#[derive(Debug)]
pub struct ColumnView<'a> {
    pub column: &'a Column,
    pub cards: Vec<&'a Card>,
}

impl ColumnView<'_> {
    /// Card count shown in the column header, after filters
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

/// What a finished drag gesture did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing to persist: cancelled, unresolvable, or same status
    Ignored,
    /// The card was moved; this is the backend's record of it
    Moved(Card),
}

/// Board state behind the kanban view.
///
/// Owns the stores (through the sync coordinator), the transient filters
/// and the drag session. All mutation goes through the coordinator.
pub struct BoardController {
    config: BoardConfig,
    sync: SyncCoordinator,
    drag: DragSession,
    filters: FilterState,
}

impl BoardController {
    pub fn new(sync: SyncCoordinator) -> Self {
        Self {
            config: BoardConfig::default(),
            sync,
            drag: DragSession::new(),
            filters: FilterState::default(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// Card edits, creation, deletion and approver management
    pub fn sync_mut(&mut self) -> &mut SyncCoordinator {
        &mut self.sync
    }

    pub async fn load(&mut self) -> Result<CardSource> {
        self.sync.load().await
    }

    pub fn cards(&self) -> &[Card] {
        self.sync.cards().cards()
    }

    pub fn is_empty(&self) -> bool {
        self.sync.cards().is_empty()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn toggle_approver_filter(&mut self, name: impl Into<String>) {
        self.filters.toggle_approver(name);
    }

    pub fn set_approver_filter<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) {
        self.filters.set_approvers(names);
    }

    pub fn set_team_filter(&mut self, teams: impl IntoIterator<Item = ExecutionTeam>) {
        self.filters.set_teams(teams);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Visible cards of one column
    pub fn column(&self, stage: Stage) -> Vec<&Card> {
        classify(self.cards(), stage, &self.filters)
    }

    /// Every column in pipeline order
    pub fn columns(&self) -> Vec<ColumnView<'_>> {
        self.config
            .columns
            .iter()
            .map(|column| ColumnView {
                column,
                cards: classify(self.cards(), column.stage, &self.filters),
            })
            .collect()
    }

    /// Overdue cards across the whole board, ignoring filters
    pub fn overdue_count_on(&self, today: NaiveDate) -> usize {
        self.sync.cards().overdue_count_on(today)
    }

    pub fn overdue_count(&self) -> usize {
        self.overdue_count_on(dates::today())
    }

    pub fn on_drag_start(&mut self, card_id: CardId) {
        tracing::debug!(card_id = %card_id, "Drag started");
        self.drag.start(card_id);
    }

    /// Card shown in the floating drag preview
    pub fn dragged_card(&self) -> Option<&Card> {
        self.drag.active().and_then(|id| self.sync.cards().get(id))
    }

    pub fn on_drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Finishes the gesture and persists the resulting transition, if any.
    ///
    /// The drag session is idle when this returns, whatever the outcome.
    pub async fn on_drag_end(&mut self, drop_target: Option<&str>) -> Result<DropOutcome> {
        let Some((source, target)) = self.drag.end(drop_target) else {
            return Ok(DropOutcome::Ignored);
        };
        self.move_card(&source, &target).await
    }

    /// Moves a card as if it were dropped onto `target` (a column or card id)
    pub async fn move_card(&mut self, card_id: &CardId, target: &str) -> Result<DropOutcome> {
        let Some(transition) = self.plan_move(card_id, target) else {
            tracing::debug!(card_id = %card_id, drop_target = %target, "Drop needs no transition");
            return Ok(DropOutcome::Ignored);
        };

        let card = self
            .sync
            .apply_transition(&transition.card_id, transition.target)
            .await?;
        Ok(DropOutcome::Moved(card))
    }

    /// Resolves a drop without persisting anything
    pub fn plan_move(&self, card_id: &CardId, target: &str) -> Option<Transition> {
        resolve_drop(self.cards(), card_id, target).map(|stage| Transition {
            card_id: card_id.clone(),
            target: stage,
        })
    }
}
