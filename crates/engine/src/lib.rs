//! Group expense ledger and settlement engine.
//!
//! The [`Engine`] stores groups, members and expenses (with their payer and
//! split shares) in a relational database, appends an audit entry for every
//! expense mutation, and derives per-member balances and a settlement plan
//! from the stored expenses. Group changes are pushed to connected clients
//! through the [`Notifier`].

pub use balance::{Balance, aggregate_balances};
pub use commands::{ExtraMember, NewExpenseCmd, NewGroupCmd, UpdateExpenseCmd, UpdateGroupCmd};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseId};
pub use groups::{Group, GroupId};
pub use history::{ExpenseSnapshot, HistoryAction, HistoryEntry, HistoryId};
pub use members::{Member, MemberId};
pub use money::MoneyCents;
pub use notifier::{
    ConnectError, IdentityVerifier, MembershipLookup, Notifier, OutboundEvent, Session, SessionId,
    SessionState, UnauthorizedReason, VerifyError,
};
pub use ops::{Engine, EngineBuilder};
pub use settlement::{
    GroupDebts, NamedBalance, NamedSettlement, Position, Settlement, group_debts, position, settle,
};
pub use shares::Share;

mod balance;
mod commands;
mod error;
mod expenses;
mod group_members;
mod groups;
mod history;
mod members;
mod money;
pub mod notifier;
mod ops;
mod settlement;
mod shares;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
