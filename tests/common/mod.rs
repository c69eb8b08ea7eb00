use rosca::application::engine::RotationEngine;
use rosca::domain::member::MemberId;
use rosca::infrastructure::in_memory::{InMemoryGroupStore, InMemoryPayoutLedger};
use std::io::Error;
use std::path::Path;

pub fn members(ids: &[&str]) -> Vec<MemberId> {
    ids.iter().map(|id| MemberId::from(*id)).collect()
}

pub fn in_memory_engine() -> (RotationEngine, InMemoryPayoutLedger) {
    let ledger = InMemoryPayoutLedger::new();
    let engine = RotationEngine::new(
        Box::new(InMemoryGroupStore::new()),
        Box::new(ledger.clone()),
    );
    (engine, ledger)
}

/// Writes a command file that creates one group of `size` members and drives
/// it through `rounds` full rounds.
pub fn generate_rotation_csv(path: &Path, size: usize, rounds: u64) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["type", "group", "member", "amount", "members"])?;

    let ids: Vec<String> = (0..size).map(|i| format!("M{i}")).collect();
    let joined = ids.join(";");
    wtr.write_record(["create", "", "", "10", joined.as_str()])?;

    for round in 0..rounds {
        let recipient = (round % size as u64) as usize;
        for (i, id) in ids.iter().enumerate() {
            if i != recipient {
                wtr.write_record(["contribute", "1", id.as_str(), "10", ""])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
