use rosca::domain::group::{Group, Payout};
use rosca::domain::member::{GroupId, MemberId};
use rosca::domain::ports::{GroupStoreBox, PayoutLedgerBox};
use rosca::infrastructure::in_memory::{InMemoryGroupStore, InMemoryPayoutLedger};

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let store: GroupStoreBox = Box::new(InMemoryGroupStore::new());
    let ledger: PayoutLedgerBox = Box::new(InMemoryPayoutLedger::new());

    // Verify Send + Sync by spawning tasks
    let store_handle = tokio::spawn(async move {
        let id = store.next_id().await.unwrap();
        let group = Group::new(id, vec![MemberId::from("A"), MemberId::from("B")], 1).unwrap();
        store.insert(group).await.unwrap();
        store.get(id).await.unwrap().unwrap()
    });

    let ledger_handle = tokio::spawn(async move {
        ledger
            .disburse(&Payout {
                group: GroupId(1),
                round: 0,
                recipient: "A".into(),
                amount: 1,
            })
            .await
    });

    let group = store_handle.await.unwrap();
    assert_eq!(group.id(), GroupId(1));
    assert!(ledger_handle.await.unwrap().is_ok());
}
