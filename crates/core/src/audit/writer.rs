use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Background task that drains the audit channel into storage
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Consume events until every `AuditHandle` has been dropped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord::from_event(envelope.timestamp, envelope.event);

            if let Err(e) = self.store.insert(&record) {
                tracing::error!(event_type = %record.event_type, "Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Create the audit pipeline.
///
/// Spawn the returned writer with `tokio::spawn(writer.run())` and clone the
/// handle wherever events are emitted.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = AuditHandle::new(tx);
    let writer = AuditWriter::new(rx, store);
    (handle, writer)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::audit::{AuditError, AuditEvent, AuditFilter};

    /// Store that keeps records in memory, optionally failing every insert
    struct MockStore {
        records: Mutex<Vec<AuditRecord>>,
        should_fail: bool,
    }

    impl MockStore {
        fn new(should_fail: bool) -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                should_fail,
            })
        }

        fn records(&self) -> Vec<AuditRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl AuditStore for MockStore {
        fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
            if self.should_fail {
                return Err(AuditError::Database("Mock failure".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let mut stored = record.clone();
            stored.id = records.len() as i64 + 1;
            records.push(stored);
            Ok(records.len() as i64)
        }

        fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
            Ok(self.records())
        }

        fn count(&self, _filter: &AuditFilter) -> Result<i64, AuditError> {
            Ok(self.records.lock().unwrap().len() as i64)
        }
    }

    fn booked(ticket_id: &str) -> AuditEvent {
        AuditEvent::TicketBooked {
            ticket_id: ticket_id.to_string(),
            event_id: "e-1".to_string(),
            holder_id: "u-1".to_string(),
            price: 10.0,
        }
    }

    #[tokio::test]
    async fn test_writer_stores_events_in_order() {
        let store = MockStore::new(false);
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        handle
            .emit(AuditEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            })
            .await;
        handle.emit(booked("t-1")).await;
        handle
            .emit(AuditEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;
        drop(handle);

        writer_task.await.unwrap();

        let records = store.records();
        let types: Vec<&str> = records.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(types, ["service_started", "ticket_booked", "service_stopped"]);
        assert_eq!(records[1].ticket_id.as_deref(), Some("t-1"));
        assert_eq!(records[1].event_id.as_deref(), Some("e-1"));
        assert_eq!(records[1].user_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn test_writer_continues_on_insert_failure() {
        let store = MockStore::new(true);
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_task = tokio::spawn(writer.run());

        handle.emit(booked("t-1")).await;
        handle.emit(booked("t-2")).await;
        drop(handle);

        writer_task.await.unwrap();
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_writer_waits_for_all_handles_to_drop() {
        let store = MockStore::new(false);
        let (main_handle, writer) = create_audit_system(store.clone(), 10);
        let booking_handle = main_handle.clone();
        let writer_task = tokio::spawn(writer.run());

        booking_handle.emit(booked("t-1")).await;
        drop(main_handle);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!writer_task.is_finished());

        drop(booking_handle);
        let result = tokio::time::timeout(Duration::from_secs(1), writer_task).await;
        assert!(result.is_ok(), "Writer should exit after all handles dropped");
        assert_eq!(store.records().len(), 1);
    }
}
