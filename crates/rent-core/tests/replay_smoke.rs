use rent_core::{DriverState, EventStore, InMemoryEventStore, RunEventKind, RunInstance, StepId, StepStatus};
use serde_json::json;
use uuid::Uuid;

#[test]
fn replay_tracks_driver_state_through_events() {
    let mut store = InMemoryEventStore::default();
    let run_id = Uuid::new_v4();

    let ev = store.append_kind(run_id,
                               RunEventKind::RunInitialized { project: "nyc_airbnb".into(),
                                                              group: "development".into(),
                                                              active_steps: vec![StepId::Download,
                                                                                 StepId::BasicCleaning] });
    assert_eq!(ev.seq, 0);
    assert_eq!(RunInstance::replay(run_id, &store.list(run_id)).state, DriverState::Idle);

    store.append_kind(run_id,
                      RunEventKind::StepStarted { step: StepId::Download,
                                                  params_fingerprint: "p0".into() });
    let inst = RunInstance::replay(run_id, &store.list(run_id));
    assert_eq!(inst.state, DriverState::InStep(StepId::Download));
    assert_eq!(inst.slot(StepId::BasicCleaning).status, StepStatus::Pending);
    assert_eq!(inst.slot(StepId::DataSplit).status, StepStatus::Skipped);

    store.append_kind(run_id,
                      RunEventKind::StepFinished { step: StepId::Download,
                                                   produced: vec!["sample.csv".into()],
                                                   summary: json!({}) });
    store.append_kind(run_id,
                      RunEventKind::StepStarted { step: StepId::BasicCleaning,
                                                  params_fingerprint: "p1".into() });
    store.append_kind(run_id,
                      RunEventKind::StepFailed { step: StepId::BasicCleaning,
                                                 error: "artifact not found".into() });

    let inst = RunInstance::replay(run_id, &store.list(run_id));
    assert_eq!(inst.state, DriverState::Failed(StepId::BasicCleaning));
    assert_eq!(inst.finished(), vec![StepId::Download]);
    let slot = inst.slot(StepId::BasicCleaning);
    assert_eq!(slot.error.as_deref(), Some("artifact not found"));
    assert_eq!(slot.params_fingerprint.as_deref(), Some("p1"));
    assert!(store.list(Uuid::new_v4()).is_empty());
}

#[test]
fn events_are_serializable() {
    let kind = RunEventKind::StepFinished { step: StepId::DataSplit,
                                            produced: vec!["trainval_data.csv".into(), "test_data.csv".into()],
                                            summary: json!({"train_rows": 8, "test_rows": 2}) };
    let v = serde_json::to_value(&kind).unwrap();
    assert_eq!(v["StepFinished"]["step"], json!("data_split"));
    let back: RunEventKind = serde_json::from_value(v).unwrap();
    assert_eq!(back, kind);
}
