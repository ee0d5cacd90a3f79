use crate::normalize::NormalizedProductRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};

/// Keeps records in memory, in emission order
///
/// Useful for library callers that post-process records themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<NormalizedProductRecord>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[NormalizedProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NormalizedProductRecord> {
        self.records
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: NormalizedProductRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.records.push(record);
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }

    fn emitted(&self) -> usize {
        self.records.len()
    }
}
