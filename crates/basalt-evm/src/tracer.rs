//! Per-step instrumentation
//!
//! A [`Tracer`] observes every instruction the interpreter dispatches.
//! It is handed in explicitly by the caller; the engine itself never
//! installs one behind the scenes. [`NoopTracer`] is the default and
//! compiles down to nothing.

/// Snapshot of the machine just before an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    /// Program counter
    pub pc: usize,
    /// Raw opcode byte about to execute
    pub opcode: u8,
    /// Gas remaining in the frame before this step is charged
    pub gas_remaining: u64,
    /// Operand stack depth
    pub stack_depth: usize,
    /// Call nesting depth (1 = top-level frame)
    pub call_depth: usize,
}

/// Observer invoked once per dispatched instruction.
pub trait Tracer {
    /// Called before each instruction is charged and applied
    fn on_step(&mut self, record: StepRecord);
}

/// Tracer that ignores every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn on_step(&mut self, _record: StepRecord) {}
}

/// Tracer that records every step, for tests and debugging.
#[derive(Debug, Default)]
pub struct CollectingTracer {
    /// All observed steps, in dispatch order
    pub steps: Vec<StepRecord>,
}

impl Tracer for CollectingTracer {
    fn on_step(&mut self, record: StepRecord) {
        self.steps.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_tracer_keeps_order() {
        let mut tracer = CollectingTracer::default();
        for pc in 0..3 {
            tracer.on_step(StepRecord {
                pc,
                opcode: 0x01,
                gas_remaining: 100 - pc as u64,
                stack_depth: pc,
                call_depth: 1,
            });
        }
        assert_eq!(tracer.steps.len(), 3);
        assert_eq!(tracer.steps[2].pc, 2);
        assert_eq!(tracer.steps[2].gas_remaining, 98);
    }
}
