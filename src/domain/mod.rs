pub mod approver;
pub mod board;
pub mod card;
pub mod dates;
pub mod drag;
pub mod filter;
pub mod id;
pub(crate) mod nullable;

pub use approver::{Approver, ApproverId, ApproverPatch, ApproverRef, NewApprover};
pub use board::{BoardConfig, Column, Stage};
pub use card::{Card, CardId, CardPatch, CardStatus, ExecutionTeam, NewCard};
pub use drag::{resolve_drop, DragSession, Transition};
pub use filter::{classify, classify_all, FilterState};
