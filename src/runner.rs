//! Observation hooks for the dispatch loop: a minimal trait any embedder can
//! implement to watch execution step by step, without the interpreter itself
//! depending on a logging framework.

use crate::common::{CallResult, FailureReason};
use crate::opcode::{opcode_name, OpCode};
use crate::state::Frame;
use std::collections::HashMap;

/// Called once per dispatched instruction and once at the end of a call.
/// Default methods are no-ops, so an implementation only needs to override
/// what it cares about.
pub trait Runner {
    fn on_step(&mut self, _frame: &Frame, _op: OpCode) {}
    fn on_finish(&mut self, _frame: &Frame, _failure: Option<FailureReason>) {}
}

/// The default: observes nothing, costs nothing.
#[derive(Default)]
pub struct NoopRunner;

impl Runner for NoopRunner {}

/// Emits a `tracing` event per instruction and on completion, at `trace`
/// level so it stays silent unless an embedder explicitly turns it up.
#[derive(Default)]
pub struct LoggingRunner;

impl Runner for LoggingRunner {
    fn on_step(&mut self, frame: &Frame, op: OpCode) {
        tracing::trace!(
            pc = frame.pc,
            op = opcode_name(op),
            gas_left = frame.gas_left,
            stack_depth = frame.stack.len(),
            "step"
        );
    }

    fn on_finish(&mut self, frame: &Frame, failure: Option<FailureReason>) {
        match failure {
            Some(reason) => tracing::debug!(status = ?frame.status, %reason, "call failed"),
            None => tracing::debug!(status = ?frame.status, gas_left = frame.gas_left, "call finished"),
        }
    }
}

/// Tallies how often each opcode (and each 2/3/4-opcode window preceding it)
/// appears, useful for finding new fusion candidates for the converter's
/// peephole matcher.
#[derive(Default)]
pub struct StatisticsRunner {
    pub opcode_counts: HashMap<OpCode, u64>,
    pub window2_counts: HashMap<(OpCode, OpCode), u64>,
    pub window3_counts: HashMap<(OpCode, OpCode, OpCode), u64>,
    pub window4_counts: HashMap<(OpCode, OpCode, OpCode, OpCode), u64>,
    history: [Option<OpCode>; 3],
    pub calls_observed: u64,
    pub failures: HashMap<FailureReason, u64>,
}

/// Sorted, host-friendly dump of a [`StatisticsRunner`]'s tallies, most
/// frequent first.
#[derive(Debug, Default)]
pub struct StatisticsReport {
    pub opcode_counts: Vec<(OpCode, u64)>,
    pub window2_counts: Vec<((OpCode, OpCode), u64)>,
    pub window3_counts: Vec<((OpCode, OpCode, OpCode), u64)>,
    pub window4_counts: Vec<((OpCode, OpCode, OpCode, OpCode), u64)>,
    pub calls_observed: u64,
    pub failures: Vec<(FailureReason, u64)>,
}

fn sorted_by_count<K: Copy>(map: &HashMap<K, u64>) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

impl StatisticsRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the current tallies into sorted tables, for dumping by
    /// whatever embeds the interpreter (a CLI flag, an admin endpoint, ...).
    pub fn report(&self) -> StatisticsReport {
        StatisticsReport {
            opcode_counts: sorted_by_count(&self.opcode_counts),
            window2_counts: sorted_by_count(&self.window2_counts),
            window3_counts: sorted_by_count(&self.window3_counts),
            window4_counts: sorted_by_count(&self.window4_counts),
            calls_observed: self.calls_observed,
            failures: sorted_by_count(&self.failures),
        }
    }
}

impl Runner for StatisticsRunner {
    fn on_step(&mut self, _frame: &Frame, op: OpCode) {
        *self.opcode_counts.entry(op).or_insert(0) += 1;

        if let Some(a) = self.history[2] {
            *self.window2_counts.entry((a, op)).or_insert(0) += 1;
        }
        if let (Some(a), Some(b)) = (self.history[1], self.history[2]) {
            *self.window3_counts.entry((a, b, op)).or_insert(0) += 1;
        }
        if let (Some(a), Some(b), Some(c)) = (self.history[0], self.history[1], self.history[2]) {
            *self.window4_counts.entry((a, b, c, op)).or_insert(0) += 1;
        }

        self.history = [self.history[1], self.history[2], Some(op)];
    }

    fn on_finish(&mut self, _frame: &Frame, failure: Option<FailureReason>) {
        self.calls_observed += 1;
        self.history = [None, None, None];
        if let Some(reason) = failure {
            *self.failures.entry(reason).or_insert(0) += 1;
        }
    }
}

/// Convenience no-op sink for callers that want a [`CallResult`] without
/// wiring up a real [`Runner`].
pub fn discard(_result: &CallResult) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CallKind, CallParams, Revision};
    use bytes::Bytes;
    use ethereum_types::Address;

    fn frame() -> Frame {
        Frame::new(CallParams {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            code: Bytes::new(),
            code_hash: None,
            input: Bytes::new(),
            gas: 100,
            recipient: Address::zero(),
            sender: Address::zero(),
            origin: Address::zero(),
            coinbase: Address::zero(),
            value: ethereum_types::U256::zero(),
            gas_price: ethereum_types::U256::zero(),
            base_fee: ethereum_types::U256::zero(),
            blob_base_fee: ethereum_types::U256::zero(),
            block_number: 0,
            timestamp: 0,
            gas_limit: 0,
            prev_randao: ethereum_types::U256::zero(),
            chain_id: ethereum_types::U256::zero(),
            blob_hashes: vec![],
            revision: Revision::Cancun,
        })
    }

    #[test]
    fn statistics_runner_counts_opcodes_and_windows() {
        let mut runner = StatisticsRunner::new();
        let f = frame();
        runner.on_step(&f, OpCode::PUSH1);
        runner.on_step(&f, OpCode::PUSH1);
        runner.on_step(&f, OpCode::ADD);
        assert_eq!(runner.opcode_counts[&OpCode::PUSH1], 2);
        assert_eq!(runner.window2_counts[&(OpCode::PUSH1, OpCode::ADD)], 1);
    }

    #[test]
    fn statistics_runner_resets_window_history_between_calls() {
        let mut runner = StatisticsRunner::new();
        let f = frame();
        runner.on_step(&f, OpCode::PUSH1);
        runner.on_finish(&f, None);
        runner.on_step(&f, OpCode::ADD);
        assert!(!runner.window2_counts.contains_key(&(OpCode::PUSH1, OpCode::ADD)));
        assert_eq!(runner.calls_observed, 1);
    }

    #[test]
    fn report_sorts_tallies_by_descending_count() {
        let mut runner = StatisticsRunner::new();
        let f = frame();
        runner.on_step(&f, OpCode::PUSH1);
        runner.on_step(&f, OpCode::PUSH1);
        runner.on_step(&f, OpCode::ADD);
        let report = runner.report();
        assert_eq!(report.opcode_counts[0], (OpCode::PUSH1, 2));
        assert_eq!(report.opcode_counts[1], (OpCode::ADD, 1));
    }

    #[test]
    fn noop_runner_does_nothing_observable() {
        let mut runner = NoopRunner;
        runner.on_step(&frame(), OpCode::STOP);
        runner.on_finish(&frame(), Some(FailureReason::OutOfGas));
    }
}
