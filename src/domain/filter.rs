use crate::domain::{
    board::Stage,
    card::{Card, ExecutionTeam},
};
use std::collections::BTreeSet;

/// Transient, client-only filter selection. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Approver display names; applies to every column
    pub approvers: BTreeSet<String>,
    /// Execution teams; applies only to the pending-execution column
    pub teams: BTreeSet<ExecutionTeam>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty() && self.teams.is_empty()
    }

    /// Adds the approver to the selection, or removes it if already selected
    pub fn toggle_approver(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.approvers.remove(&name) {
            self.approvers.insert(name);
        }
    }

    /// Replaces the approver selection; repeated names collapse into one
    pub fn set_approvers<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) {
        self.approvers = names.into_iter().map(Into::into).collect();
    }

    pub fn set_teams(&mut self, teams: impl IntoIterator<Item = ExecutionTeam>) {
        self.teams = teams.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.approvers.clear();
        self.teams.clear();
    }

    fn matches_approvers(&self, card: &Card) -> bool {
        self.approvers.is_empty()
            || card
                .approvers
                .iter()
                .any(|approver| self.approvers.contains(&approver.display_name()))
    }

    fn matches_team(&self, stage: Stage, card: &Card) -> bool {
        stage != Stage::PendingExecution
            || self.teams.is_empty()
            || self.teams.contains(&card.executor)
    }
}

/// Cards shown in `stage`'s column.
///
/// Keeps store order. Approver matches are OR across a card's approvers; the
/// approver and team axes are ANDed.
pub fn classify<'a>(cards: &'a [Card], stage: Stage, filters: &FilterState) -> Vec<&'a Card> {
    cards
        .iter()
        .filter(|card| card.is_in(stage))
        .filter(|card| filters.matches_approvers(card))
        .filter(|card| filters.matches_team(stage, card))
        .collect()
}

/// Every stage paired with its classified cards, in pipeline order
pub fn classify_all<'a>(cards: &'a [Card], filters: &FilterState) -> Vec<(Stage, Vec<&'a Card>)> {
    Stage::ALL
        .into_iter()
        .map(|stage| (stage, classify(cards, stage, filters)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        approver::{Approver, ApproverId, ApproverRef},
        card::{CardId, CardStatus},
    };

    fn card(id: i64, status: &str, executor: ExecutionTeam, approvers: &[&str]) -> Card {
        Card {
            id: CardId::from_number(id),
            title: format!("GMUD-{id:03}"),
            gmud_link: String::new(),
            executor,
            open_date: None,
            execution_forecast: None,
            status: CardStatus::from(status.to_string()),
            approvers: approvers
                .iter()
                .map(|name| {
                    let (first, last) = name.split_once(' ').unwrap();
                    ApproverRef::Resolved(Approver::new(ApproverId::new(*name), first, last))
                })
                .collect(),
        }
    }

    fn sample() -> Vec<Card> {
        vec![
            card(1, "aberta", ExecutionTeam::DevOps, &["Jane Doe", "John Roe"]),
            card(2, "aberta", ExecutionTeam::Data, &["John Roe"]),
            card(3, "pendente-execucao", ExecutionTeam::Network, &["Jane Doe"]),
            card(4, "pendente-execucao", ExecutionTeam::DevOps, &["John Roe"]),
            card(5, "concluido", ExecutionTeam::Network, &[]),
            card(6, "arquivada", ExecutionTeam::Data, &["Jane Doe"]),
            card(7, "pendente-aprovacao-2", ExecutionTeam::Operations, &["Jane Doe"]),
        ]
    }

    fn ids(cards: &[&Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_unfiltered_columns_partition_known_cards() {
        let cards = sample();
        let columns = classify_all(&cards, &FilterState::default());

        let mut seen: Vec<String> = columns.iter().flat_map(|(_, c)| ids(c)).collect();
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total, "columns must be disjoint");

        let known: Vec<&Card> = cards.iter().filter(|c| c.stage().is_some()).collect();
        assert_eq!(total, known.len());
        assert!(!seen.contains(&"6".to_string()), "unknown status is not shown");
    }

    #[test]
    fn test_preserves_store_order() {
        let cards = sample();
        let open = classify(&cards, Stage::Open, &FilterState::default());
        assert_eq!(ids(&open), vec!["1", "2"]);
    }

    #[test]
    fn test_approver_filter_matches_any_approver() {
        let cards = sample();
        let mut filters = FilterState::default();
        filters.toggle_approver("Jane Doe");

        let open = classify(&cards, Stage::Open, &filters);
        assert_eq!(ids(&open), vec!["1"]);

        let pending_execution = classify(&cards, Stage::PendingExecution, &filters);
        assert_eq!(ids(&pending_execution), vec!["3"]);
    }

    #[test]
    fn test_set_approvers_collapses_repeats() {
        let mut filters = FilterState::default();
        filters.set_approvers(["Jane Doe", "Jane Doe"]);
        assert_eq!(filters.approvers.len(), 1);
        assert!(filters.approvers.contains("Jane Doe"));
    }

    #[test]
    fn test_toggle_approver_twice_clears() {
        let mut filters = FilterState::default();
        filters.toggle_approver("Jane Doe");
        filters.toggle_approver("Jane Doe");
        assert!(filters.is_empty());
    }

    #[test]
    fn test_team_filter_only_narrows_pending_execution() {
        let cards = sample();
        let unfiltered = classify_all(&cards, &FilterState::default());

        let mut filters = FilterState::default();
        filters.set_teams([ExecutionTeam::DevOps]);
        let filtered = classify_all(&cards, &filters);

        for ((stage, before), (_, after)) in unfiltered.iter().zip(filtered.iter()) {
            if *stage == Stage::PendingExecution {
                assert_eq!(ids(after), vec!["4"]);
            } else {
                assert_eq!(before.len(), after.len());
            }
        }
    }

    #[test]
    fn test_approver_and_team_filters_combine() {
        let cards = sample();
        let mut filters = FilterState::default();
        filters.toggle_approver("Jane Doe");
        filters.set_teams([ExecutionTeam::DevOps]);

        assert!(classify(&cards, Stage::PendingExecution, &filters).is_empty());

        filters.set_teams([ExecutionTeam::Network]);
        assert_eq!(ids(&classify(&cards, Stage::PendingExecution, &filters)), vec!["3"]);
    }

    #[test]
    fn test_classify_does_not_mutate_input() {
        let cards = sample();
        let before = cards.clone();
        let mut filters = FilterState::default();
        filters.toggle_approver("John Roe");
        let _ = classify_all(&cards, &filters);
        assert_eq!(cards, before);
    }
}
