use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Pipeline stage a card occupies on the board.
///
/// The set is fixed and ordered; it is not user-extensible. Wire ids match
/// the backend's `status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "aberta")]
    Open,
    #[serde(rename = "pendente-aprovacao-1")]
    PendingApproval1,
    #[serde(rename = "pendente-aprovacao-2")]
    PendingApproval2,
    #[serde(rename = "pendente-execucao")]
    PendingExecution,
    #[serde(rename = "concluido")]
    Done,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 5] = [
        Stage::Open,
        Stage::PendingApproval1,
        Stage::PendingApproval2,
        Stage::PendingExecution,
        Stage::Done,
    ];

    /// Terminal stage; cards here are completed and never overdue
    pub const TERMINAL: Stage = Stage::Done;

    /// Identifier used on the wire and as the column's drop-target id
    pub fn id(&self) -> &'static str {
        match self {
            Self::Open => "aberta",
            Self::PendingApproval1 => "pendente-aprovacao-1",
            Self::PendingApproval2 => "pendente-aprovacao-2",
            Self::PendingExecution => "pendente-execucao",
            Self::Done => "concluido",
        }
    }

    /// Display title of the stage's column
    pub fn title(&self) -> &'static str {
        match self {
            Self::Open => "Aberta",
            Self::PendingApproval1 => "Pendente Aprovação 1",
            Self::PendingApproval2 => "Pendente Aprovação 2",
            Self::PendingExecution => "Pendente de Execução",
            Self::Done => "Concluído",
        }
    }

    /// Accent color of the stage's column
    pub fn color(&self) -> &'static str {
        match self {
            Self::Open => "#52c41a",
            Self::PendingApproval1 => "#1890ff",
            Self::PendingApproval2 => "#faad14",
            Self::PendingExecution => "#f5222d",
            Self::Done => "#722ed1",
        }
    }

    /// Looks up a stage by its wire id, returning `None` for anything else
    pub fn from_id(id: &str) -> Option<Stage> {
        Self::ALL.into_iter().find(|stage| stage.id() == id)
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::TERMINAL
    }
}

impl FromStr for Stage {
    type Err = crate::error::BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::from_id(s).ok_or_else(|| {
            crate::error::BoardError::Validation(format!(
                "Unknown stage '{}'. Valid stages: {}",
                s,
                Stage::ALL.map(|stage| stage.id()).join(", ")
            ))
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Static configuration for a board column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub stage: Stage,
    pub title: &'static str,
    pub color: &'static str,
}

impl Column {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            title: stage.title(),
            color: stage.color(),
        }
    }

    /// Drop-target id of the column itself
    pub fn id(&self) -> &'static str {
        self.stage.id()
    }
}

/// Board configuration
#[derive(Debug, Clone, Serialize)]
pub struct BoardConfig {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "GMUD".to_string(),
            columns: Stage::ALL.into_iter().map(Column::new).collect(),
        }
    }
}

impl BoardConfig {
    /// Gets the column configuration for a stage
    pub fn column_for_stage(&self, stage: Stage) -> Option<&Column> {
        self.columns.iter().find(|col| col.stage == stage)
    }
}
