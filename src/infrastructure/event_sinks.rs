//! Event sink implementations beyond the tracing default

use parking_lot::Mutex;
use std::sync::Arc;

use crate::domain::events::{EventSink, ExecutorEvent};

/// Keeps every emitted event in order
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<ExecutorEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutorEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: ExecutorEvent) {
        self.events.lock().push(event);
    }
}

/// Forwards each event to every inner sink
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: ExecutorEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::TracingEventSink;
    use crate::shared::types::AccountId;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        sink.emit(ExecutorEvent::Paused { by: AccountId::from("owner") });
        sink.emit(ExecutorEvent::Unpaused { by: AccountId::from("owner") });

        let names: Vec<_> = sink.events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["paused", "unpaused"]);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let memory = Arc::new(MemoryEventSink::new());
        let fanout = FanoutEventSink::new(vec![
            memory.clone() as Arc<dyn EventSink>,
            Arc::new(TracingEventSink),
        ]);
        fanout.emit(ExecutorEvent::Paused { by: AccountId::from("owner") });
        assert_eq!(memory.len(), 1);
    }
}
