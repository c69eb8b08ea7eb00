use crate::domain::group::{GroupView, Payout};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct GroupRow<'a> {
    group: u64,
    round: u64,
    cycle: u64,
    recipient: &'a str,
    contribution_amount: u64,
    contributors: usize,
    balance: u64,
    members: String,
}

impl<'a> From<&'a GroupView> for GroupRow<'a> {
    fn from(view: &'a GroupView) -> Self {
        Self {
            group: view.id.0,
            round: view.current_round,
            cycle: view.cycle,
            recipient: view.current_recipient.as_str(),
            contribution_amount: view.contribution_amount,
            contributors: view.contributors.len(),
            balance: view.balance,
            members: view
                .members
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

#[derive(Serialize)]
struct PayoutRow<'a> {
    group: u64,
    round: u64,
    recipient: &'a str,
    amount: u64,
}

const GROUP_HEADER: [&str; 8] = [
    "group",
    "round",
    "cycle",
    "recipient",
    "contribution_amount",
    "contributors",
    "balance",
    "members",
];

const PAYOUT_HEADER: [&str; 4] = ["group", "round", "recipient", "amount"];

/// Writes group snapshots or payouts as CSV.
///
/// The header row is always written, even for an empty report.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    /// One row per group; members are joined with `;`.
    pub fn write_groups(&mut self, groups: &[GroupView]) -> Result<()> {
        self.writer.write_record(GROUP_HEADER)?;
        for view in groups {
            self.writer.serialize(GroupRow::from(view))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_payouts(&mut self, payouts: &[Payout]) -> Result<()> {
        self.writer.write_record(PAYOUT_HEADER)?;
        for payout in payouts {
            self.writer.serialize(PayoutRow {
                group: payout.group.0,
                round: payout.round,
                recipient: payout.recipient.as_str(),
                amount: payout.amount,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::Group;
    use crate::domain::member::{GroupId, MemberId};

    #[test]
    fn test_write_groups() {
        let mut group = Group::new(
            GroupId(1),
            vec![MemberId::from("A"), MemberId::from("B"), MemberId::from("C")],
            100,
        )
        .unwrap();
        group.contribute(&"B".into(), 100).unwrap();

        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_groups(&[group.view()])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "group,round,cycle,recipient,contribution_amount,contributors,balance,members\n\
             1,0,0,A,100,1,100,A;B;C\n"
        );
    }

    #[test]
    fn test_write_payouts() {
        let payout = Payout {
            group: GroupId(2),
            round: 3,
            recipient: "D".into(),
            amount: 300,
        };

        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_payouts(&[payout]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "group,round,recipient,amount\n2,3,D,300\n");
    }

    #[test]
    fn test_empty_reports_write_header() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_groups(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "group,round,cycle,recipient,contribution_amount,contributors,balance,members\n"
        );

        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_payouts(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "group,round,recipient,amount\n"
        );
    }
}
