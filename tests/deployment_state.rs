// ABOUTME: Integration tests for the deployment state machine.
// ABOUTME: Verifies creation, single terminal transition, and conflict detection.

use shipyard::deploy::{DeploymentStatus, DeploymentTracker, InvariantKind, InvariantViolation, Outcome};
use shipyard::types::{EnvironmentName, Revision};

fn staging() -> EnvironmentName {
    EnvironmentName::new("staging").unwrap()
}

fn rev(value: &str) -> Revision {
    Revision::new(value).unwrap()
}

#[test]
fn created_deployment_is_in_progress() {
    let mut tracker = DeploymentTracker::new();
    let deployment = tracker.create(&staging(), &rev("abc")).unwrap();

    assert_eq!(deployment.status(), DeploymentStatus::InProgress);
    assert!(deployment.url().is_none());
    assert_eq!(tracker.deployments().len(), 1);
}

#[test]
fn transition_sets_terminal_status_and_url() {
    let mut tracker = DeploymentTracker::new();
    let deployment = tracker.create(&staging(), &rev("abc")).unwrap();

    let done = tracker
        .transition(&deployment, Outcome::Success, Some("https://x.example".into()))
        .unwrap();

    assert_eq!(done.status(), DeploymentStatus::Success);
    assert_eq!(done.url(), Some("https://x.example"));
    assert_eq!(tracker.get(deployment.id()), Some(&done));
}

#[test]
fn second_transition_is_an_invariant_violation() {
    let mut tracker = DeploymentTracker::new();
    let deployment = tracker.create(&staging(), &rev("abc")).unwrap();
    tracker.transition(&deployment, Outcome::Success, None).unwrap();

    let err = tracker
        .transition(&deployment, Outcome::Failure, None)
        .unwrap_err();

    assert_eq!(err.kind(), InvariantKind::InvalidTransition);
    match err {
        InvariantViolation::InvalidTransition { from, to, .. } => {
            assert_eq!(from, DeploymentStatus::Success);
            assert_eq!(to, DeploymentStatus::Failure);
        }
        other => panic!("unexpected violation: {other}"),
    }
    assert_eq!(
        tracker.get(deployment.id()).unwrap().status(),
        DeploymentStatus::Success
    );
}

#[test]
fn concurrent_create_for_same_target_conflicts() {
    let mut tracker = DeploymentTracker::new();
    let first = tracker.create(&staging(), &rev("abc")).unwrap();

    let err = tracker.create(&staging(), &rev("abc")).unwrap_err();
    match err {
        InvariantViolation::Conflict { existing, .. } => assert_eq!(&existing, first.id()),
        other => panic!("unexpected violation: {other}"),
    }
}

#[test]
fn finished_deployment_can_be_redeployed() {
    let mut tracker = DeploymentTracker::new();
    let first = tracker.create(&staging(), &rev("abc")).unwrap();
    tracker.transition(&first, Outcome::Failure, None).unwrap();

    let second = tracker.create(&staging(), &rev("abc")).unwrap();
    assert_ne!(first.id(), second.id());
}

#[test]
fn other_revision_does_not_conflict() {
    let mut tracker = DeploymentTracker::new();
    tracker.create(&staging(), &rev("abc")).unwrap();
    assert!(tracker.create(&staging(), &rev("def")).is_ok());
}

mod state_machine_properties {
    use super::*;
    use proptest::prelude::*;
    use shipyard::deploy::Deployment;
    use shipyard::rollback::{MemoryRollbackStore, RollbackErrorKind, RollbackStore, SnapshotMetadata};
    use shipyard::types::{DeploymentId, RunId, ServiceName};

    #[derive(Debug, Clone)]
    enum Op {
        Create { revision: usize },
        Transition { target: usize, success: bool },
        /// Record from the tracker's current view, or from the copy returned by `create`.
        Record { target: usize, stale: bool },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize).prop_map(|revision| Op::Create { revision }),
            (any::<usize>(), any::<bool>())
                .prop_map(|(target, success)| Op::Transition { target, success }),
            (any::<usize>(), any::<bool>()).prop_map(|(target, stale)| Op::Record { target, stale }),
        ]
    }

    fn metadata() -> SnapshotMetadata {
        SnapshotMetadata {
            service: ServiceName::new("web").unwrap(),
            version: "web-1".to_string(),
            run_id: RunId::new("prop"),
        }
    }

    proptest! {
        #[test]
        fn success_is_final_and_snapshots_follow_success(ops in proptest::collection::vec(op(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let revisions = [rev("aaa111"), rev("bbb222"), rev("ccc333")];
            let mut tracker = DeploymentTracker::new();
            let store = MemoryRollbackStore::new();
            let mut created: Vec<Deployment> = Vec::new();
            let mut succeeded: Vec<DeploymentId> = Vec::new();

            for op in ops {
                match op {
                    Op::Create { revision } => {
                        if let Ok(deployment) = tracker.create(&staging(), &revisions[revision]) {
                            prop_assert_eq!(deployment.status(), DeploymentStatus::InProgress);
                            created.push(deployment);
                        }
                    }
                    Op::Transition { target, success } => {
                        if created.is_empty() {
                            continue;
                        }
                        let id = created[target % created.len()].id().clone();
                        let current = tracker.get(&id).unwrap().clone();
                        let outcome = if success { Outcome::Success } else { Outcome::Failure };
                        match tracker.transition(&current, outcome, None) {
                            Ok(done) => {
                                prop_assert_eq!(current.status(), DeploymentStatus::InProgress);
                                if done.status() == DeploymentStatus::Success {
                                    succeeded.push(id);
                                }
                            }
                            Err(e) => {
                                prop_assert!(current.status().is_terminal());
                                prop_assert_eq!(e.kind(), InvariantKind::InvalidTransition);
                            }
                        }
                    }
                    Op::Record { target, stale } => {
                        if created.is_empty() {
                            continue;
                        }
                        let original = &created[target % created.len()];
                        let deployment = if stale {
                            original.clone()
                        } else {
                            tracker.get(original.id()).unwrap().clone()
                        };
                        let recorded = runtime.block_on(store.record(&deployment, metadata()));
                        match recorded {
                            Ok(snapshot) => {
                                prop_assert!(succeeded.contains(&snapshot.deployment_id));
                            }
                            Err(e) => {
                                prop_assert_eq!(e.kind(), RollbackErrorKind::PreconditionFailed);
                                prop_assert_ne!(deployment.status(), DeploymentStatus::Success);
                            }
                        }
                    }
                }

                for id in &succeeded {
                    prop_assert_eq!(tracker.get(id).unwrap().status(), DeploymentStatus::Success);
                }
            }

            let snapshots = runtime.block_on(store.list(&staging())).unwrap();
            for snapshot in &snapshots {
                prop_assert!(succeeded.contains(&snapshot.deployment_id));
            }
        }
    }
}
