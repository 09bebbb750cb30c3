//! VM state management: frames, stacks, program counter and run state.

use log::debug;
use tac_common::{ErrorKind, Program, Value};

use crate::error::RuntimeError;
use crate::frames::Frames;
use crate::io::Io;

/// Exit codes EXIT accepts.
pub const EXIT_CODES: std::ops::RangeInclusive<i64> = 0..=9;

/// Execution state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// More instructions may run.
    Running,
    /// Stopped normally, with this exit code.
    Halted(u8),
    /// Stopped on an error of this kind.
    Failed(ErrorKind),
}

/// The virtual machine. Borrows its program and I/O for the whole run.
pub struct Machine<'a, I: Io> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Input and output streams.
    pub(crate) io: &'a mut I,
    /// Global, local and temporary frames.
    pub(crate) frames: Frames,
    /// Operand stack for PUSHS/POPS.
    pub(crate) data_stack: Vec<Value>,
    /// Orders of the CALL instructions awaiting RETURN.
    pub(crate) call_stack: Vec<u64>,
    /// Program counter (an order number).
    pub(crate) pc: u64,
    pub(crate) state: State,
    /// The error that stopped the machine, if any.
    failure: Option<RuntimeError>,
}

impl<'a, I: Io> Machine<'a, I> {
    /// Create a machine positioned at order 1.
    pub fn new(program: &'a Program, io: &'a mut I) -> Self {
        Self {
            program,
            io,
            frames: Frames::new(),
            data_stack: Vec::new(),
            call_stack: Vec::new(),
            pc: 1,
            state: State::Running,
            failure: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn frames(&self) -> &Frames {
        &self.frames
    }

    pub fn data_stack(&self) -> &[Value] {
        &self.data_stack
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Execute one instruction.
    ///
    /// The first instruction at or after the counter runs, then the counter
    /// advances by one. Past the last instruction the machine halts with
    /// code 0. On a halted machine `step` does nothing; on a failed one it
    /// returns the error that stopped it.
    pub fn step(&mut self) -> Result<State, RuntimeError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        if self.state != State::Running {
            return Ok(self.state);
        }

        let program = self.program;
        let Some(instr) = program.next_from(self.pc) else {
            self.halt(0);
            return Ok(self.state);
        };

        self.pc = instr.order;
        if let Err(e) = self.execute(instr) {
            debug!("failed at {}: {e}", instr.order);
            self.state = State::Failed(e.kind());
            self.failure = Some(e.clone());
            return Err(e);
        }

        if self.state == State::Running {
            self.pc += 1;
        }
        Ok(self.state)
    }

    /// Run until the program halts or fails. Returns the exit code.
    ///
    /// Output is flushed either way. A flush failure is reported only when
    /// the program itself succeeded.
    pub fn run(&mut self) -> Result<u8, RuntimeError> {
        let result = loop {
            match self.step() {
                Ok(State::Halted(code)) => break Ok(code),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };

        let at = self.pc;
        let flushed = self.io.flush().map_err(|e| RuntimeError::Output {
            at,
            message: e.to_string(),
        });
        let code = result?;
        flushed?;
        Ok(code)
    }

    pub(crate) fn halt(&mut self, code: u8) {
        debug!("halted with code {code} at pc {}", self.pc);
        self.state = State::Halted(code);
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.data_stack.push(value);
    }

    pub(crate) fn pop(&mut self, at: u64) -> Result<Value, RuntimeError> {
        self.data_stack
            .pop()
            .ok_or(RuntimeError::EmptyDataStack { at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIo;
    use tac_common::InstructionRecord;
    use tac_verifier::verify;

    fn program(records: Vec<InstructionRecord>) -> Program {
        verify(&records).unwrap()
    }

    #[test]
    fn starts_running_at_one() {
        let program = program(vec![InstructionRecord::new(1, "CREATEFRAME")]);
        let mut io = MemoryIo::new();
        let machine = Machine::new(&program, &mut io);
        assert_eq!(machine.state(), State::Running);
        assert_eq!(machine.pc(), 1);
    }

    #[test]
    fn step_by_step() {
        let program = program(vec![
            InstructionRecord::new(1, "PUSHS").int(1),
            InstructionRecord::new(5, "PUSHS").int(2),
        ]);
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);

        assert_eq!(machine.step(), Ok(State::Running));
        assert_eq!(machine.pc(), 2);
        assert_eq!(machine.data_stack(), &[Value::Int(1)]);

        // Gap between 2 and 5 is skipped in one step.
        assert_eq!(machine.step(), Ok(State::Running));
        assert_eq!(machine.pc(), 6);
        assert_eq!(machine.data_stack().len(), 2);

        assert_eq!(machine.step(), Ok(State::Halted(0)));
        assert_eq!(machine.step(), Ok(State::Halted(0)));
    }

    #[test]
    fn failure_is_sticky() {
        let program = program(vec![InstructionRecord::new(1, "POPFRAME")]);
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);

        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FrameNotAvailable);
        assert_eq!(machine.state(), State::Failed(ErrorKind::FrameNotAvailable));
        assert_eq!(machine.step(), Err(err));
    }

    #[test]
    fn run_after_failure_reports_the_failure() {
        let program = program(vec![InstructionRecord::new(1, "POPFRAME")]);
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);

        let first = machine.run().unwrap_err();
        assert_eq!(machine.run(), Err(first.clone()));
        assert_eq!(machine.state(), State::Failed(first.kind()));
    }

    /// Captures output in memory but cannot flush.
    struct BrokenFlush(MemoryIo);

    impl Io for BrokenFlush {
        fn read_line(&mut self) -> Option<String> {
            self.0.read_line()
        }

        fn write_str(&mut self, s: &str) -> std::io::Result<()> {
            self.0.write_str(s)
        }

        fn write_diagnostic(&mut self, s: &str) -> std::io::Result<()> {
            self.0.write_diagnostic(s)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn execution_error_outranks_flush_error() {
        let program = program(vec![InstructionRecord::new(1, "RETURN")]);
        let mut io = BrokenFlush(MemoryIo::new());
        let mut machine = Machine::new(&program, &mut io);
        assert_eq!(machine.run(), Err(RuntimeError::EmptyCallStack { at: 1 }));
    }

    #[test]
    fn flush_error_reported_after_success() {
        let program = program(vec![InstructionRecord::new(1, "WRITE").int(1)]);
        let mut io = BrokenFlush(MemoryIo::new());
        let mut machine = Machine::new(&program, &mut io);
        let err = machine.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn exit_stops_counter() {
        let program = program(vec![
            InstructionRecord::new(3, "EXIT").int(4),
            InstructionRecord::new(4, "PUSHS").int(1),
        ]);
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);
        assert_eq!(machine.run(), Ok(4));
        assert_eq!(machine.pc(), 3);
        assert!(machine.data_stack().is_empty());
    }

    #[test]
    fn empty_program_halts_immediately() {
        let program = Program::default();
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);
        assert_eq!(machine.run(), Ok(0));
    }
}
