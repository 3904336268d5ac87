//! Property tests for `TaskStore` list bookkeeping.
//!
//! Uses proptest to verify:
//! 1. After any sequence of adds and deletes, the list length equals the
//!    number of adds minus the number of successful deletes.
//! 2. A delete with an out-of-range index leaves the list unchanged.
//! 3. Operations on one identity never touch the other.

use chrono::{NaiveDate, NaiveDateTime};
use duetask::tasks::{Task, TaskStore};
use duetask_proto::Identity;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Delete(usize),
}

fn deadline() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 17)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{1,12}".prop_map(Op::Add),
        (0usize..16).prop_map(Op::Delete),
    ]
}

fn arb_identity() -> impl Strategy<Value = Identity> {
    prop_oneof![Just(Identity::A), Just(Identity::B)]
}

proptest! {
    #[test]
    fn length_tracks_adds_minus_successful_deletes(ops in prop::collection::vec(arb_op(), 0..64)) {
        let store = TaskStore::new();
        let mut adds = 0usize;
        let mut deletes = 0usize;

        for op in ops {
            match op {
                Op::Add(name) => {
                    store.append(Identity::A, Task::new(name, deadline()));
                    adds += 1;
                }
                Op::Delete(index) => {
                    if store.delete(Identity::A, index).is_ok() {
                        deletes += 1;
                    }
                }
            }
            prop_assert_eq!(store.len(Identity::A), adds - deletes);
        }
    }

    #[test]
    fn invalid_delete_changes_nothing(
        names in prop::collection::vec("[a-z]{1,8}", 0..8),
        extra in 0usize..8,
    ) {
        let store = TaskStore::new();
        for name in &names {
            store.append(Identity::B, Task::new(name.clone(), deadline()));
        }
        let before = store.list(Identity::B);

        prop_assert!(store.delete(Identity::B, names.len() + extra).is_err());
        prop_assert_eq!(store.list(Identity::B), before);
    }

    #[test]
    fn identities_are_isolated(
        ops in prop::collection::vec((arb_identity(), arb_op()), 0..32),
    ) {
        let store = TaskStore::new();
        let mut model: [Vec<String>; 2] = [Vec::new(), Vec::new()];

        for (identity, op) in ops {
            let slot = usize::from(identity == Identity::B);
            match op {
                Op::Add(name) => {
                    store.append(identity, Task::new(name.clone(), deadline()));
                    model[slot].push(name);
                }
                Op::Delete(index) => {
                    let ok = store.delete(identity, index).is_ok();
                    prop_assert_eq!(ok, index < model[slot].len());
                    if ok {
                        model[slot].remove(index);
                    }
                }
            }
        }

        for (slot, identity) in Identity::ALL.into_iter().enumerate() {
            let names: Vec<String> = store.list(identity).into_iter().map(|t| t.name).collect();
            prop_assert_eq!(&names, &model[slot]);
        }
    }
}
