//! Observability sink for units of work.
//!
//! Every primary operation (connect, table and column collection, snapshot
//! build, query execution, explain) is reported as one [`UnitReport`] to a
//! [`TraceSink`] carried by the [`ExecContext`]. The sink is injected; there is
//! no process-wide tracer.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{event, Level};

/// The traceable operations of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    CollectTables,
    CollectColumns,
    CollectSnapshot,
    PrepareAndExecute,
    Explain,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::CollectTables => "collect_tables",
            Operation::CollectColumns => "collect_columns",
            Operation::CollectSnapshot => "collect_snapshot",
            Operation::PrepareAndExecute => "prepare_and_execute",
            Operation::Explain => "explain",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error(String),
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Counters reported alongside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Rows,
    Columns,
    Tables,
}

impl Counter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Rows => "rows",
            Counter::Columns => "columns",
            Counter::Tables => "tables",
        }
    }
}

/// A finished unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub operation: Operation,
    pub status: Status,
    pub counters: Vec<(Counter, u64)>,
    pub attributes: Vec<(String, String)>,
}

impl UnitReport {
    /// Look up a counter value.
    pub fn counter(&self, counter: Counter) -> Option<u64> {
        self.counters
            .iter()
            .find(|(c, _)| *c == counter)
            .map(|(_, v)| *v)
    }

    /// Look up the first attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Receiver of unit-of-work reports.
pub trait TraceSink: Send + Sync {
    fn record(&self, report: UnitReport);
}

/// Sink that forwards reports to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, report: UnitReport) {
        let counters = report
            .counters
            .iter()
            .map(|(c, v)| format!("{}={}", c.as_str(), v))
            .collect::<Vec<_>>()
            .join(" ");
        match &report.status {
            Status::Ok => event!(
                Level::INFO,
                operation = report.operation.as_str(),
                counters = %counters,
                "unit of work completed"
            ),
            Status::Error(message) => event!(
                Level::ERROR,
                operation = report.operation.as_str(),
                counters = %counters,
                error = %message,
                "unit of work failed"
            ),
        }
        for (key, value) in &report.attributes {
            event!(
                Level::DEBUG,
                operation = report.operation.as_str(),
                key = %key,
                value = %value,
                "unit attribute"
            );
        }
    }
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&self, _report: UnitReport) {}
}

/// Sink that keeps reports in memory, for inspection in tests and tooling.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<UnitReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports recorded so far.
    pub fn reports(&self) -> Vec<UnitReport> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Reports for one operation, in recording order.
    pub fn reports_for(&self, operation: Operation) -> Vec<UnitReport> {
        self.reports()
            .into_iter()
            .filter(|r| r.operation == operation)
            .collect()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, report: UnitReport) {
        match self.reports.lock() {
            Ok(mut reports) => reports.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}

/// Per-call execution context.
#[derive(Clone)]
pub struct ExecContext {
    sink: Arc<dyn TraceSink>,
}

impl ExecContext {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &dyn TraceSink {
        self.sink.as_ref()
    }

    /// Start a unit of work; it is reported when finished.
    pub fn unit(&self, operation: Operation) -> Unit<'_> {
        Unit {
            ctx: self,
            operation,
            counters: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext").finish_non_exhaustive()
    }
}

/// An in-flight unit of work.
#[must_use = "a unit is only reported once finished"]
pub struct Unit<'a> {
    ctx: &'a ExecContext,
    operation: Operation,
    counters: Vec<(Counter, u64)>,
    attributes: Vec<(String, String)>,
}

impl Unit<'_> {
    pub fn counter(&mut self, counter: Counter, value: u64) {
        if let Some(slot) = self.counters.iter_mut().find(|(c, _)| *c == counter) {
            slot.1 = value;
        } else {
            self.counters.push((counter, value));
        }
    }

    pub fn attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub fn finish_ok(self) {
        self.finish(Status::Ok);
    }

    pub fn finish_err(self, err: &dyn fmt::Display) {
        self.finish(Status::Error(err.to_string()));
    }

    /// Report `Ok` or the error of `result`, passing the result through.
    pub fn finish_with<T, E: fmt::Display>(self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.finish_ok(),
            Err(e) => self.finish_err(e),
        }
        result
    }

    fn finish(self, status: Status) {
        self.ctx.sink.record(UnitReport {
            operation: self.operation,
            status,
            counters: self.counters,
            attributes: self.attributes,
        });
    }
}
