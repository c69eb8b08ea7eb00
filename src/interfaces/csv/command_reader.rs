use crate::domain::member::{GroupId, MemberId};
use crate::error::{Result, RoscaError};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Contribute,
    Advance,
}

/// One raw CSV row: `type, group, member, amount, members`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub group: Option<u64>,
    pub member: Option<String>,
    pub amount: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_members")]
    pub members: Vec<MemberId>,
}

/// `A;B;C` into an ordered member list. An empty cell is an empty list.
fn deserialize_members<'de, D>(deserializer: D) -> std::result::Result<Vec<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(list) if !list.is_empty() => list.split(';').map(MemberId::from).collect(),
        _ => Vec::new(),
    })
}

/// A validated engine call.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Create {
        members: Vec<MemberId>,
        contribution_amount: u64,
    },
    Contribute {
        group: GroupId,
        member: MemberId,
        amount: u64,
    },
    Advance {
        group: GroupId,
    },
}

fn required<T>(value: Option<T>, field: &str, kind: &str) -> Result<T> {
    value.ok_or_else(|| RoscaError::MalformedCommand(format!("{kind} requires `{field}`")))
}

impl TryFrom<CommandRecord> for Command {
    type Error = RoscaError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        match record.r#type {
            CommandType::Create => Ok(Command::Create {
                contribution_amount: required(record.amount, "amount", "create")?,
                members: record.members,
            }),
            CommandType::Contribute => Ok(Command::Contribute {
                group: GroupId(required(record.group, "group", "contribute")?),
                member: MemberId::from(required(
                    record.member.filter(|m| !m.is_empty()),
                    "member",
                    "contribute",
                )?),
                amount: required(record.amount, "amount", "contribute")?,
            }),
            CommandType::Advance => Ok(Command::Advance {
                group: GroupId(required(record.group, "group", "advance")?),
            }),
        }
    }
}

/// Reads engine commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// so trailing empty columns may be left out.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates commands, one per row.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| Command::try_from(result.map_err(RoscaError::from)?))
    }
}
