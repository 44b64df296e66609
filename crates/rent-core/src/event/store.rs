use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Registro append-only de los eventos de cada run.
///
/// `seq` empieza en 0 y es contiguo dentro de un run; `list` devuelve los
/// eventos en ese orden. `runs` devuelve los runs en el orden en que se
/// registró su primer evento.
pub trait EventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
    fn runs(&self) -> Vec<Uuid>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    by_run: HashMap<Uuid, Vec<RunEvent>>,
    order: Vec<Uuid>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        if !self.by_run.contains_key(&run_id) {
            self.order.push(run_id);
        }
        let events = self.by_run.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.by_run.get(&run_id).cloned().unwrap_or_default()
    }

    fn runs(&self) -> Vec<Uuid> {
        self.order.clone()
    }
}
