use crate::framework::core::{IntakeError, ResponseRecord};
use crate::framework::correlation::CorrelationTable;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry point the UI runtime calls to answer a forwarded request.
///
/// Cheap to clone; every clone resolves requests in the same table.
#[derive(Debug, Clone)]
pub struct Responder {
    table: Arc<CorrelationTable>,
}

impl Responder {
    pub fn new(table: Arc<CorrelationTable>) -> Self {
        Self { table }
    }

    /// Deliver the response for request `id`.
    ///
    /// Fails with [`IntakeError::InvalidRequestId`] when `id` was never issued,
    /// was already answered, or has timed out. Such a failure has no effect on
    /// any other request.
    pub fn respond(
        &self,
        id: u64,
        status: u16,
        headers: HashMap<String, String>,
        body: impl Into<String>,
    ) -> Result<(), IntakeError> {
        self.respond_record(id, ResponseRecord::new(status, headers, body))
    }

    pub fn respond_record(&self, id: u64, record: ResponseRecord) -> Result<(), IntakeError> {
        let sender = self
            .table
            .take(id)
            .ok_or(IntakeError::InvalidRequestId(id))?;

        // The dispatcher may give up between the take and the send.
        sender
            .send(record)
            .map_err(|_| IntakeError::InvalidRequestId(id))
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.table.contains(id)
    }
}
