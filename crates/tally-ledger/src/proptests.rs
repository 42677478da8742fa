//! Property tests over random operation sequences.

use proptest::prelude::*;

use crate::contract::{HostContext, TokenContract};
use crate::events::ApprovalEvent;
use crate::response::Response;
use crate::testing::{MemoryStore, NoRemote, RecordingSink};

const HOLDERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const SUPPLY: u64 = 10_000;

#[derive(Debug, Clone)]
enum Step {
    Transfer { from: usize, to: usize, amount: u64 },
    Approve { owner: usize, spender: usize, amount: u64 },
    TransferFrom { owner: usize, spender: usize, to: usize, amount: u64 },
    Increase { owner: usize, spender: usize, amount: u64 },
    Decrease { owner: usize, spender: usize, amount: u64 },
}

fn holder() -> impl Strategy<Value = usize> {
    0..HOLDERS.len()
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (holder(), holder(), 0..3_000u64).prop_map(|(from, to, amount)| Step::Transfer { from, to, amount }),
        (holder(), holder(), 0..3_000u64)
            .prop_map(|(owner, spender, amount)| Step::Approve { owner, spender, amount }),
        (holder(), holder(), holder(), 0..3_000u64)
            .prop_map(|(owner, spender, to, amount)| Step::TransferFrom { owner, spender, to, amount }),
        (holder(), holder(), 0..3_000u64)
            .prop_map(|(owner, spender, amount)| Step::Increase { owner, spender, amount }),
        (holder(), holder(), 0..3_000u64)
            .prop_map(|(owner, spender, amount)| Step::Decrease { owner, spender, amount }),
    ]
}

struct Harness {
    store: MemoryStore,
    sink: RecordingSink,
}

impl Harness {
    fn new() -> Self {
        let harness = Self {
            store: MemoryStore::default(),
            sink: RecordingSink::default(),
        };
        let init = vec![
            "GLD".to_string(),
            "GLD".to_string(),
            "alice".to_string(),
            SUPPLY.to_string(),
        ];
        let resp = TokenContract::new()
            .init(&harness.store, &init)
            .commit(&harness.store, &harness.sink);
        assert!(resp.is_success());
        harness
    }

    fn call(&self, function: &str, args: &[String]) -> Response {
        let host = HostContext {
            store: &self.store,
            invoker: &NoRemote,
            channel_id: "ch",
        };
        TokenContract::new()
            .invoke(&host, function, args)
            .commit(&self.store, &self.sink)
    }

    fn run(&self, step: &Step) -> Response {
        let s = |i: usize| HOLDERS[i].to_string();
        match *step {
            Step::Transfer { from, to, amount } => {
                self.call("transfer", &[s(from), s(to), amount.to_string()])
            }
            Step::Approve { owner, spender, amount } => {
                self.call("approve", &[s(owner), s(spender), amount.to_string()])
            }
            Step::TransferFrom { owner, spender, to, amount } => self.call(
                "transferFrom",
                &[s(owner), s(spender), s(to), amount.to_string()],
            ),
            Step::Increase { owner, spender, amount } => {
                self.call("increaseAllowance", &[s(owner), s(spender), amount.to_string()])
            }
            Step::Decrease { owner, spender, amount } => {
                self.call("decreaseAllowance", &[s(owner), s(spender), amount.to_string()])
            }
        }
    }

    fn balance(&self, address: &str) -> u64 {
        let resp = self.call("balanceOf", &[address.to_string()]);
        if resp.is_success() {
            resp.payload_str().parse().unwrap()
        } else {
            0
        }
    }

    fn allowance(&self, owner: &str, spender: &str) -> u64 {
        let resp = self.call("allowance", &[owner.to_string(), spender.to_string()]);
        resp.payload_str().parse().unwrap()
    }

    fn approvals(&self, owner: &str) -> Vec<ApprovalEvent> {
        let resp = self.call("approvalList", &[owner.to_string()]);
        serde_json::from_slice(&resp.payload).unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_supply_is_conserved(steps in prop::collection::vec(step(), 1..40)) {
        let harness = Harness::new();
        for step in &steps {
            let _ = harness.run(step);
            let total: u64 = HOLDERS.iter().map(|h| harness.balance(h)).sum();
            prop_assert_eq!(total, SUPPLY);
        }
    }

    #[test]
    fn prop_failed_steps_change_nothing(steps in prop::collection::vec(step(), 1..30)) {
        let harness = Harness::new();
        for step in &steps {
            let before: Vec<u64> = HOLDERS.iter().map(|h| harness.balance(h)).collect();
            let allowances_before: Vec<u64> = HOLDERS
                .iter()
                .flat_map(|o| HOLDERS.iter().map(move |s| (o, s)))
                .map(|(o, s)| harness.allowance(o, s))
                .collect();

            if !harness.run(step).is_success() {
                let after: Vec<u64> = HOLDERS.iter().map(|h| harness.balance(h)).collect();
                let allowances_after: Vec<u64> = HOLDERS
                    .iter()
                    .flat_map(|o| HOLDERS.iter().map(move |s| (o, s)))
                    .map(|(o, s)| harness.allowance(o, s))
                    .collect();
                prop_assert_eq!(before, after);
                prop_assert_eq!(allowances_before, allowances_after);
            }
        }
    }

    #[test]
    fn prop_increase_then_decrease_restores(start in 1..1_000u64, delta in 1..1_000u64) {
        let harness = Harness::new();
        let args = |n: u64| ["alice".to_string(), "carol".to_string(), n.to_string()];
        prop_assert!(harness.call("approve", &args(start)).is_success());
        prop_assert!(harness.call("increaseAllowance", &args(delta)).is_success());
        prop_assert_eq!(harness.allowance("alice", "carol"), start + delta);
        prop_assert!(harness.call("decreaseAllowance", &args(delta)).is_success());
        prop_assert_eq!(harness.allowance("alice", "carol"), start);
    }

    #[test]
    fn prop_approval_list_matches_allowances(steps in prop::collection::vec(step(), 1..30)) {
        let harness = Harness::new();
        for step in &steps {
            let _ = harness.run(step);
        }
        for owner in HOLDERS {
            let listed = harness.approvals(owner);
            let mut previous: Option<String> = None;
            for entry in &listed {
                prop_assert_eq!(entry.owner.as_str(), owner);
                prop_assert_eq!(entry.amount.units(), harness.allowance(owner, &entry.spender));
                if let Some(prev) = &previous {
                    prop_assert!(prev < &entry.spender);
                }
                previous = Some(entry.spender.clone());
            }
            for spender in HOLDERS {
                let granted = harness.allowance(owner, spender);
                if granted > 0 {
                    prop_assert!(listed.iter().any(|e| e.spender == spender));
                }
            }
        }
    }
}
