use crate::domain::member::{GroupId, MemberId};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum RoscaError {
    #[error("Invalid membership: {0}")]
    #[diagnostic(code(rosca::invalid_membership))]
    InvalidMembership(String),

    #[error("Member {member} does not belong to group {group}")]
    #[diagnostic(code(rosca::not_a_member))]
    NotAMember { group: GroupId, member: MemberId },

    #[error("Member {member} already contributed in round {round} of group {group}")]
    #[diagnostic(code(rosca::duplicate_contribution))]
    DuplicateContribution {
        group: GroupId,
        member: MemberId,
        round: u64,
    },

    #[error("Wrong contribution amount for group {group}: expected {expected}, got {actual}")]
    #[diagnostic(code(rosca::wrong_amount))]
    WrongAmount {
        group: GroupId,
        expected: u64,
        actual: u64,
    },

    #[error("Member {member} receives the payout of round {round} and cannot contribute to it")]
    #[diagnostic(code(rosca::recipient_cannot_contribute))]
    RecipientCannotContribute {
        group: GroupId,
        member: MemberId,
        round: u64,
    },

    #[error("Round {round} of group {group} is not complete ({contributed} of {required} contributions)")]
    #[diagnostic(code(rosca::round_incomplete))]
    RoundIncomplete {
        group: GroupId,
        round: u64,
        contributed: usize,
        required: usize,
    },

    #[error("Group {0} not found")]
    #[diagnostic(code(rosca::group_not_found))]
    GroupNotFound(GroupId),

    #[error("Group {group} was modified concurrently (expected version {expected}), retry")]
    #[diagnostic(code(rosca::concurrent_modification))]
    ConcurrentModification { group: GroupId, expected: u64 },

    #[error("Malformed command: {0}")]
    #[diagnostic(code(rosca::malformed_command))]
    MalformedCommand(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
}

impl RoscaError {
    /// Whether repeating the same call may succeed without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}

pub type Result<T> = std::result::Result<T, RoscaError>;
