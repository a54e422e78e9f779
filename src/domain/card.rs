use crate::domain::{
    approver::{Approver, ApproverId, ApproverRef},
    board::Stage,
    dates,
    id::WireId,
    nullable,
};
use crate::error::{BoardError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned card identifier; never reused
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(WireId);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(WireId::text(id))
    }

    pub fn from_number(id: i64) -> Self {
        Self(WireId::number(id))
    }

    /// Returns the string representation, also used as the card's drop-target id
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status as stored on a card.
///
/// Values outside the five stages are kept verbatim; such a card belongs to
/// no column and is simply not shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardStatus {
    Stage(Stage),
    Unknown(String),
}

impl CardStatus {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage(stage) => Some(*stage),
            Self::Unknown(_) => None,
        }
    }
}

/// A missing or null status is an unknown one
impl Default for CardStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<Stage> for CardStatus {
    fn from(stage: Stage) -> Self {
        Self::Stage(stage)
    }
}

impl From<String> for CardStatus {
    fn from(raw: String) -> Self {
        match Stage::from_id(&raw) {
            Some(stage) => Self::Stage(stage),
            None => Self::Unknown(raw),
        }
    }
}

impl From<CardStatus> for String {
    fn from(status: CardStatus) -> Self {
        match status {
            CardStatus::Stage(stage) => stage.id().to_string(),
            CardStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(stage) => write!(f, "{}", stage),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Team responsible for executing a change
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionTeam {
    TimeDev,
    Operations,
    Data,
    DevOps,
    Network,
    /// Value not in the known enumeration, kept as received
    Other(String),
}

impl ExecutionTeam {
    pub const KNOWN: [ExecutionTeam; 5] = [
        ExecutionTeam::TimeDev,
        ExecutionTeam::Operations,
        ExecutionTeam::Data,
        ExecutionTeam::DevOps,
        ExecutionTeam::Network,
    ];

    pub fn name(&self) -> &str {
        match self {
            Self::TimeDev => "Time Dev",
            Self::Operations => "Operations",
            Self::Data => "Data",
            Self::DevOps => "DevOps",
            Self::Network => "Network",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Matches one of the known teams ignoring case and spaces, e.g. `timedev`
    pub fn parse_known(raw: &str) -> Option<Self> {
        let wanted: String = raw.split_whitespace().collect::<String>().to_lowercase();
        Self::KNOWN.into_iter().find(|team| {
            team.name().split_whitespace().collect::<String>().to_lowercase() == wanted
        })
    }
}

impl Default for ExecutionTeam {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ExecutionTeam {
    fn from(raw: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|team| team.name() == raw)
            .unwrap_or(Self::Other(raw))
    }
}

impl From<&str> for ExecutionTeam {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ExecutionTeam> for String {
    fn from(team: ExecutionTeam) -> Self {
        team.name().to_string()
    }
}

impl fmt::Display for ExecutionTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A change-request (GMUD) card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub gmud_link: String,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub executor: ExecutionTeam,
    #[serde(default, with = "dates::optional")]
    pub open_date: Option<DateTime<Utc>>,
    #[serde(default, with = "dates::optional")]
    pub execution_forecast: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub status: CardStatus,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub approvers: Vec<ApproverRef>,
}

impl Card {
    /// Stage the card is shown in, or `None` when its status is unknown
    pub fn stage(&self) -> Option<Stage> {
        self.status.stage()
    }

    pub fn is_in(&self, stage: Stage) -> bool {
        self.stage() == Some(stage)
    }

    /// Card has reached the terminal stage
    pub fn is_completed(&self) -> bool {
        self.stage().is_some_and(|s| s.is_terminal())
    }

    /// Forecast day is strictly before `today` and the card is not completed
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        !self.is_completed()
            && self
                .execution_forecast
                .is_some_and(|forecast| dates::local_day(&forecast) < today)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(dates::today())
    }

    /// Whole days from `today` until the forecast; negative when overdue
    pub fn days_until_forecast_on(&self, today: NaiveDate) -> Option<i64> {
        self.execution_forecast
            .map(|forecast| (dates::local_day(&forecast) - today).num_days())
    }

    /// Whether there is a link to open; an empty link shows a warning instead
    pub fn has_link(&self) -> bool {
        !self.gmud_link.trim().is_empty()
    }

    pub fn open_date_display(&self) -> String {
        self.open_date.as_ref().map(dates::format_for_display).unwrap_or_default()
    }

    pub fn execution_forecast_display(&self) -> String {
        self.execution_forecast
            .as_ref()
            .map(dates::format_for_display)
            .unwrap_or_default()
    }

    /// Display names of the card's approvers, in stored order
    pub fn approver_names(&self) -> Vec<String> {
        self.approvers.iter().map(ApproverRef::display_name).collect()
    }

    /// Replaces bare approver tokens with directory records where possible
    pub fn resolve_approvers(&mut self, directory: &[Approver]) {
        let approvers = std::mem::take(&mut self.approvers);
        self.approvers = approvers
            .into_iter()
            .map(|approver| approver.resolve(directory))
            .collect();
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(BoardError::Validation("Title is required".to_string()));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<()> {
    if link.trim().is_empty() {
        return Err(BoardError::Validation("GMUD link is required".to_string()));
    }
    match reqwest::Url::parse(link.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(BoardError::Validation(format!("Invalid GMUD link '{}'", link))),
    }
}

fn validate_executor(executor: &ExecutionTeam) -> Result<()> {
    if !executor.is_known() {
        return Err(BoardError::Validation(format!(
            "Unknown execution team '{}'",
            executor
        )));
    }
    Ok(())
}

fn validate_approvers(approver_ids: &[ApproverId]) -> Result<()> {
    if approver_ids.is_empty() {
        return Err(BoardError::Validation(
            "At least one approver is required".to_string(),
        ));
    }
    Ok(())
}

/// Payload for creating a card; new cards always start in the first stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub title: String,
    pub gmud_link: String,
    pub executor: ExecutionTeam,
    #[serde(with = "dates::required")]
    pub open_date: DateTime<Utc>,
    #[serde(with = "dates::required")]
    pub execution_forecast: DateTime<Utc>,
    status: Stage,
    pub approver_ids: Vec<ApproverId>,
}

impl NewCard {
    pub fn new(
        title: impl Into<String>,
        gmud_link: impl Into<String>,
        executor: ExecutionTeam,
        open_date: DateTime<Utc>,
        execution_forecast: DateTime<Utc>,
        approver_ids: Vec<ApproverId>,
    ) -> Self {
        Self {
            title: title.into(),
            gmud_link: gmud_link.into(),
            executor,
            open_date,
            execution_forecast,
            status: Stage::Open,
            approver_ids,
        }
    }

    pub fn status(&self) -> Stage {
        self.status
    }

    /// Form-level checks run before anything is sent
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_link(&self.gmud_link)?;
        validate_approvers(&self.approver_ids)?;
        validate_executor(&self.executor)?;
        Ok(())
    }
}

/// Partial card update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmud_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutionTeam>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "dates::optional::serialize"
    )]
    pub open_date: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "dates::optional::serialize"
    )]
    pub execution_forecast: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_ids: Option<Vec<ApproverId>>,
}

impl CardPatch {
    /// Patch that only moves the card to another stage
    pub fn status(stage: Stage) -> Self {
        Self {
            status: Some(stage),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Same checks as creation, applied to the fields present
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(link) = &self.gmud_link {
            validate_link(link)?;
        }
        if let Some(ids) = &self.approver_ids {
            validate_approvers(ids)?;
        }
        if let Some(executor) = &self.executor {
            validate_executor(executor)?;
        }
        Ok(())
    }

    /// Applies the patch the way the backend does, joining approver ids
    /// against `directory`
    pub fn apply_to(&self, card: &mut Card, directory: &[Approver]) {
        if let Some(title) = &self.title {
            card.title = title.clone();
        }
        if let Some(link) = &self.gmud_link {
            card.gmud_link = link.clone();
        }
        if let Some(executor) = &self.executor {
            card.executor = executor.clone();
        }
        if let Some(open_date) = self.open_date {
            card.open_date = Some(open_date);
        }
        if let Some(forecast) = self.execution_forecast {
            card.execution_forecast = Some(forecast);
        }
        if let Some(stage) = self.status {
            card.status = CardStatus::Stage(stage);
        }
        if let Some(ids) = &self.approver_ids {
            card.approvers = ids
                .iter()
                .map(|id| ApproverRef::Unresolved(id.clone()).resolve(directory))
                .collect();
        }
    }
}
