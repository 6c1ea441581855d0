//! Store properties, checked against both backends.
//!
//! Each property is written once over `&dyn Store` and run against a
//! file-backed `SqliteStore` and a `MemoryStore`.

use std::sync::Arc;

use proptest::prelude::*;

use prchecklist_core::{CheckSet, CheckUpdate, ChecklistRef, UserId};
use prchecklist_store::{
    Bucket, ErrorKind, MemoryStore, SqliteStore, Store, StoreError, StoreExt,
};
use prchecklist_testkit::generators::{check_ops, invalid_checklist_ref};
use prchecklist_testkit::{
    init_tracing, random_schedule, sample_user, seed_users, CheckModel, TestFixture,
};

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

fn reference() -> ChecklistRef {
    ChecklistRef::new("motemen", "test-repository", 2)
}

/// Both backends, with the fixture kept alive alongside the SQLite one.
fn backends() -> Vec<(&'static str, Arc<dyn Store>, Option<TestFixture>)> {
    let fixture = TestFixture::new();
    let sqlite: Arc<dyn Store> = Arc::new(fixture.store.clone());
    let memory: Arc<dyn Store> = Arc::new(MemoryStore::new());
    vec![("sqlite", sqlite, Some(fixture)), ("memory", memory, None)]
}

// ─────────────────────────────────────────────────────────────────────────────
// Check state
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_is_idempotent() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();

        let first = store.add_check(&r, "deploy", ALICE).await.unwrap();
        let after_first = store.fetch_checks(&r).await.unwrap();
        let second = store.add_check(&r, "deploy", ALICE).await.unwrap();
        let after_second = store.fetch_checks(&r).await.unwrap();

        assert_eq!(first, CheckUpdate::Changed, "{name}");
        assert_eq!(second, CheckUpdate::Unchanged, "{name}");
        assert_eq!(after_first, after_second, "{name}");
        assert_eq!(after_second.checked_by("deploy"), &[ALICE], "{name}");
    }
}

#[tokio::test]
async fn remove_of_absent_check_is_unchanged() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();

        let update = store.remove_check(&r, "deploy", ALICE).await.unwrap();
        assert_eq!(update, CheckUpdate::Unchanged, "{name}");
        assert!(store.fetch_checks(&r).await.unwrap().is_empty(), "{name}");

        // Another user's check on the item doesn't make ALICE's removable.
        store.add_check(&r, "deploy", BOB).await.unwrap();
        let update = store.remove_check(&r, "deploy", ALICE).await.unwrap();
        assert_eq!(update, CheckUpdate::Unchanged, "{name}");
        assert_eq!(store.fetch_checks(&r).await.unwrap().checked_by("deploy"), &[BOB]);
    }
}

#[tokio::test]
async fn fetch_reflects_add_and_remove() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();

        store.add_check(&r, "deploy", ALICE).await.unwrap();
        store.add_check(&r, "smoke", ALICE).await.unwrap();
        store.add_check(&r, "deploy", BOB).await.unwrap();

        let checks = store.fetch_checks(&r).await.unwrap();
        assert!(checks.is_checked("deploy", ALICE), "{name}");
        assert!(checks.is_checked("deploy", BOB), "{name}");
        assert!(checks.is_checked("smoke", ALICE), "{name}");
        assert_eq!(checks.user_ids(), vec![ALICE, BOB], "{name}");

        assert_eq!(
            store.remove_check(&r, "deploy", ALICE).await.unwrap(),
            CheckUpdate::Changed,
            "{name}"
        );
        let checks = store.fetch_checks(&r).await.unwrap();
        assert!(!checks.is_checked("deploy", ALICE), "{name}");
        assert!(checks.is_checked("deploy", BOB), "{name}");
        assert!(checks.is_checked("smoke", ALICE), "{name}");
    }
}

#[tokio::test]
async fn stages_and_numbers_are_separate_checklists() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let default = reference();
        let production = ChecklistRef::with_stage("motemen", "test-repository", 2, "production");
        let other_pr = ChecklistRef::new("motemen", "test-repository", 3);

        store.add_check(&default, "deploy", ALICE).await.unwrap();

        assert!(store.fetch_checks(&production).await.unwrap().is_empty(), "{name}");
        assert!(store.fetch_checks(&other_pr).await.unwrap().is_empty(), "{name}");
        assert_eq!(
            store.add_check(&production, "deploy", ALICE).await.unwrap(),
            CheckUpdate::Changed,
            "{name}"
        );
    }
}

#[tokio::test]
async fn fresh_reference_is_empty() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let checks = store
            .fetch_checks(&ChecklistRef::new("nobody", "nothing", 999))
            .await
            .unwrap();
        assert_eq!(checks, CheckSet::new(), "{name}");
    }
}

#[tokio::test]
async fn set_check_dispatches() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();

        assert!(store.set_check(&r, "deploy", ALICE, true).await.unwrap().is_changed());
        assert!(!store.set_check(&r, "deploy", ALICE, true).await.unwrap().is_changed());
        assert!(store.fetch_checks(&r).await.unwrap().is_checked("deploy", ALICE), "{name}");

        assert!(store.set_check(&r, "deploy", ALICE, false).await.unwrap().is_changed());
        assert!(!store.fetch_checks(&r).await.unwrap().is_checked("deploy", ALICE), "{name}");
    }
}

#[tokio::test]
async fn fetch_checks_with_users_resolves_checkers() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();
        seed_users(store.as_ref(), &[1, 2, 3]).await.unwrap();

        store.add_check(&r, "deploy", ALICE).await.unwrap();
        store.add_check(&r, "smoke", BOB).await.unwrap();
        store.add_check(&r, "smoke", ALICE).await.unwrap();

        let (checks, users) = store.fetch_checks_with_users(&r).await.unwrap();
        assert_eq!(checks.len(), 2, "{name}");
        assert_eq!(users.len(), 2, "{name}");
        assert_eq!(users[&ALICE], sample_user(1), "{name}");
        assert_eq!(users[&BOB], sample_user(2), "{name}");
    }
}

#[tokio::test]
async fn fetch_checks_with_users_on_fresh_reference() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let (checks, users) = store.fetch_checks_with_users(&reference()).await.unwrap();
        assert!(checks.is_empty(), "{name}");
        assert!(users.is_empty(), "{name}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_users_is_all_or_nothing() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        seed_users(store.as_ref(), &[1, 3]).await.unwrap();

        let err = store
            .fetch_users(&[UserId(1), UserId(2), UserId(3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{name}");
        assert!(
            matches!(err, StoreError::NotFound { id: UserId(2), .. }),
            "{name}: {err}"
        );

        let users = store.fetch_users(&[UserId(3), UserId(1), UserId(3)]).await.unwrap();
        assert_eq!(users.len(), 2, "{name}");
        assert_eq!(users[&UserId(3)].login, "user3", "{name}");
    }
}

#[tokio::test]
async fn upsert_user_overwrites() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let mut user = sample_user(5);
        store.upsert_user(&user).await.unwrap();
        user.login = "renamed".into();
        store.upsert_user(&user).await.unwrap();

        let users = store.fetch_users(&[UserId(5)]).await.unwrap();
        assert_eq!(users[&UserId(5)].login, "renamed", "{name}");
    }
}

#[tokio::test]
async fn zero_user_id_is_rejected() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let err = store.upsert_user(&sample_user(0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUser, "{name}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation and corruption
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn zero_user_never_enters_a_check_set() {
    init_tracing();
    for (name, store, _fixture) in backends() {
        let r = reference();
        seed_users(store.as_ref(), &[1]).await.unwrap();
        store.add_check(&r, "deploy", ALICE).await.unwrap();

        let err = store.add_check(&r, "deploy", UserId(0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUser, "{name}");
        let err = store.remove_check(&r, "deploy", UserId(0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUser, "{name}");

        let (checks, users) = store.fetch_checks_with_users(&r).await.unwrap();
        assert_eq!(checks.checked_by("deploy"), &[ALICE], "{name}");
        assert_eq!(users.len(), 1, "{name}");
    }
}

#[tokio::test]
async fn decode_order_survives_a_write() {
    init_tracing();
    let fixture = TestFixture::new();
    let store = &fixture.store;
    let r = reference();
    store
        .write_raw(Bucket::Checks, &r.key(), br#"{"zeta":[1],"alpha":[2]}"#.to_vec())
        .await
        .unwrap();

    let checks = store.fetch_checks(&r).await.unwrap();
    let order: Vec<_> = checks.iter().map(|(item, _)| item).collect();
    assert_eq!(order, ["zeta", "alpha"]);

    store.add_check(&r, "mid", UserId(3)).await.unwrap();
    let raw = store.read_raw(Bucket::Checks, &r.key()).await.unwrap().unwrap();
    assert_eq!(raw, br#"{"zeta":[1],"alpha":[2],"mid":[3]}"#);
}

#[tokio::test]
async fn invalid_reference_leaves_storage_untouched() {
    init_tracing();
    let fixture = TestFixture::new();
    let store = &fixture.store;
    let r = reference();
    store.add_check(&r, "deploy", ALICE).await.unwrap();

    let keys_before = store.keys(Bucket::Checks).await.unwrap();
    let bytes_before = store.read_raw(Bucket::Checks, &r.key()).await.unwrap();

    let invalid = [
        ChecklistRef::new("", "test-repository", 2),
        ChecklistRef::new("motemen", "", 2),
        ChecklistRef::new("motemen", "test-repository", 0),
        ChecklistRef::with_stage("motemen", "test-repository", 2, ""),
        ChecklistRef::new("motemen/evil", "test-repository", 2),
    ];
    for bad in &invalid {
        let err = store.add_check(bad, "deploy", BOB).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference, "{bad:?}");
        let err = store.remove_check(bad, "deploy", ALICE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference, "{bad:?}");
        let err = store.fetch_checks(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference, "{bad:?}");
    }

    assert_eq!(store.keys(Bucket::Checks).await.unwrap(), keys_before);
    assert_eq!(store.read_raw(Bucket::Checks, &r.key()).await.unwrap(), bytes_before);
}

#[tokio::test]
async fn corrupt_checks_fail_without_writing() {
    init_tracing();
    let fixture = TestFixture::new();
    let r = reference();
    fixture.store.add_check(&r, "deploy", ALICE).await.unwrap();

    // Corrupt the record from outside the store, through its own connection.
    {
        let conn = rusqlite::Connection::open(fixture.path()).unwrap();
        conn.busy_timeout(std::time::Duration::from_secs(5)).unwrap();
        conn.execute(
            "UPDATE checks SET value = ?1 WHERE key = ?2",
            rusqlite::params![b"{\"deploy\": [1,".to_vec(), r.key()],
        )
        .unwrap();
    }

    let err = fixture.store.fetch_checks(&r).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert!(err.to_string().contains(&r.key()), "{err}");

    let err = fixture.store.add_check(&r, "deploy", BOB).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);

    let raw = fixture.store.read_raw(Bucket::Checks, &r.key()).await.unwrap();
    assert_eq!(raw.as_deref(), Some(&b"{\"deploy\": [1,"[..]));

    // Other checklists are unaffected.
    let other = ChecklistRef::new("motemen", "test-repository", 3);
    fixture.store.add_check(&other, "deploy", BOB).await.unwrap();
}

#[tokio::test]
async fn corrupt_user_fails_batch() {
    init_tracing();
    let store = MemoryStore::new();
    seed_users(&store, &[1]).await.unwrap();
    store.write_raw(Bucket::Users, "2", b"not json".to_vec()).unwrap();

    let err = store.fetch_users(&[UserId(1), UserId(2)]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    init_tracing();
    let fixture = TestFixture::new();
    fixture
        .store
        .write_raw(
            Bucket::Users,
            "9",
            br#"{"id":9,"login":"octocat","avatar_url":"","site_admin":false}"#.to_vec(),
        )
        .await
        .unwrap();

    let users = fixture.store.fetch_users(&[UserId(9)]).await.unwrap();
    assert_eq!(users[&UserId(9)].login, "octocat");
}

// ─────────────────────────────────────────────────────────────────────────────
// Model equivalence
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn serial_schedule_matches_model() {
    init_tracing();
    let refs = [
        reference(),
        ChecklistRef::with_stage("motemen", "test-repository", 2, "production"),
        ChecklistRef::new("motemen", "other", 1),
    ];
    let items = ["deploy", "smoke", "rollback"];
    let users = [UserId(1), UserId(2), UserId(3)];

    for seed in 0..4 {
        for (name, store, _fixture) in backends() {
            let mut model = CheckModel::new();
            for op in random_schedule(seed, 150, &refs, &items, &users) {
                let got = op.apply(store.as_ref()).await.unwrap();
                assert_eq!(got, model.apply(&op), "{name} seed={seed} op={op:?}");
            }
            for r in &refs {
                assert_eq!(store.fetch_checks(r).await.unwrap(), model.checks(r), "{name} {r}");
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stores_agree_with_model(ops in check_ops(60)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let memory = MemoryStore::new();
            let sqlite = SqliteStore::open_memory().unwrap();
            let mut model = CheckModel::new();

            for op in &ops {
                let expected = model.apply(op);
                prop_assert_eq!(op.apply(&memory).await.unwrap(), expected);
                prop_assert_eq!(op.apply(&sqlite).await.unwrap(), expected);
            }
            for op in &ops {
                let expected = model.checks(&op.reference);
                prop_assert_eq!(&memory.fetch_checks(&op.reference).await.unwrap(), &expected);
                prop_assert_eq!(&sqlite.fetch_checks(&op.reference).await.unwrap(), &expected);
            }
            Ok(())
        })?;
    }

    #[test]
    fn invalid_refs_never_reach_storage(bad in invalid_checklist_ref()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = MemoryStore::new();
            let err = store.add_check(&bad, "deploy", ALICE).await.unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidReference);
            prop_assert!(store.keys(Bucket::Checks).unwrap().is_empty());
            Ok(())
        })?;
    }
}
