//! The fetch-decode-execute loop: eight registers, a program counter, and the
//! dispatch table that drives the [`ArrayTable`] and the host's byte streams.
//!
//! [`Machine`] mirrors the teacher's `Interpreter<R, W>` shape — generic over the
//! host's input and output handles, owning the memory it interprets — but trades a
//! single stack-addressed memory for eight registers plus an [`ArrayTable`], since
//! this machine has no implicit stack at all: every operand is a named register.

use std::io::{Read, Write};

use log::{info, warn};

use crate::arrays::ArrayTable;
use crate::decoder::{decode, Opcode};
use crate::error::UmError;

/// Terminal/non-terminal status of a [`Machine`]. There is no re-entry: once
/// [`Halted`](MachineState::Halted) or [`Faulted`](MachineState::Faulted), a machine
/// does not resume — a further [`Machine::run`] call is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    /// Has not yet halted or faulted.
    Running,
    /// Stopped normally, via opcode 7 or by running past the end of array 0.
    Halted,
    /// Stopped on a fatal condition; see [`UmError`] for which one.
    Faulted,
}

/// The register file, program counter, array table, and host I/O handles.
pub struct Machine<R: Read, W: Write> {
    registers: [u32; 8],
    pc: u32,
    arrays: ArrayTable,
    input: R,
    output: W,
    state: MachineState,
}

impl<R: Read, W: Write> Machine<R, W> {
    /// Builds a machine whose array 0 is `program`, fresh registers, PC at 0.
    pub fn new(program: Vec<u32>, input: R, output: W) -> Self {
        info!("machine constructed with {} word program", program.len());
        Machine {
            registers: [0; 8],
            pc: 0,
            arrays: ArrayTable::new(program),
            input,
            output,
            state: MachineState::Running,
        }
    }

    /// Builds a machine whose array table reserves `array_pool_hint` slots up front,
    /// for programs expected to allocate arrays heavily.
    pub fn with_array_capacity_hint(
        program: Vec<u32>,
        input: R,
        output: W,
        array_pool_hint: usize,
    ) -> Self {
        info!(
            "machine constructed with {} word program, array pool hint {array_pool_hint}",
            program.len()
        );
        Machine {
            registers: [0; 8],
            pc: 0,
            arrays: ArrayTable::with_capacity(program, array_pool_hint),
            input,
            output,
            state: MachineState::Running,
        }
    }

    /// The machine's current terminal/non-terminal status.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// The eight general-purpose registers, for inspection.
    pub fn registers(&self) -> &[u32; 8] {
        &self.registers
    }

    /// Runs to completion: either a clean halt (opcode 7 or falling off the end of
    /// array 0) or the first fatal condition. Calling this again after the machine
    /// has already reached a terminal state is a no-op that returns `Ok(())`.
    pub fn run(&mut self) -> Result<(), UmError> {
        if self.state != MachineState::Running {
            return Ok(());
        }
        loop {
            match self.step() {
                Ok(true) => continue,
                Ok(false) => {
                    self.state = MachineState::Halted;
                    info!("program halted cleanly");
                    return Ok(());
                }
                Err(err) => {
                    self.state = MachineState::Faulted;
                    warn!("program faulted: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Executes one instruction. Returns `Ok(true)` if the machine should keep
    /// running, `Ok(false)` on a clean halt, or `Err` on a fatal condition.
    fn step(&mut self) -> Result<bool, UmError> {
        if self.pc as usize >= self.arrays.program().len() {
            return Ok(false);
        }

        let word = self.arrays.program()[self.pc as usize];
        self.pc = self.pc.wrapping_add(1);
        let instr = decode(word)?;

        let ra = self.registers[instr.a as usize];
        let rb = self.registers[instr.b as usize];
        let rc = self.registers[instr.c as usize];

        match instr.opcode {
            Opcode::ConditionalMove => {
                if rc != 0 {
                    self.registers[instr.a as usize] = rb;
                }
            }
            Opcode::ArrayIndex => {
                self.registers[instr.a as usize] = self.arrays.read(rb, rc)?;
            }
            Opcode::ArrayAmendment => {
                self.arrays.write(ra, rb, rc)?;
            }
            Opcode::Addition => {
                self.registers[instr.a as usize] = rb.wrapping_add(rc);
            }
            Opcode::Multiplication => {
                self.registers[instr.a as usize] = rb.wrapping_mul(rc);
            }
            Opcode::Division => {
                if rc == 0 {
                    return Err(UmError::DivisionByZero);
                }
                self.registers[instr.a as usize] = rb / rc;
            }
            Opcode::NotAnd => {
                self.registers[instr.a as usize] = !(rb & rc);
            }
            Opcode::Halt => return Ok(false),
            Opcode::Allocation => {
                self.registers[instr.b as usize] = self.arrays.allocate(rc);
            }
            Opcode::Abandonment => {
                self.arrays.abandon(rc)?;
            }
            Opcode::Output => {
                let byte = (rc & 0xFF) as u8;
                self.output.write_all(&[byte]).map_err(|source| UmError::HostIo {
                    operation: "write",
                    source,
                })?;
            }
            Opcode::Input => {
                let mut buf = [0u8; 1];
                let read = loop {
                    match self.input.read(&mut buf) {
                        Ok(n) => break n,
                        Err(source) if source.kind() == std::io::ErrorKind::Interrupted => {
                            continue
                        }
                        Err(source) => {
                            return Err(UmError::HostIo {
                                operation: "read",
                                source,
                            })
                        }
                    }
                };
                self.registers[instr.c as usize] = if read == 0 {
                    0xFFFF_FFFF
                } else {
                    buf[0] as u32
                };
            }
            Opcode::LoadProgram => {
                if rb != 0 {
                    let duplicated = self.arrays.duplicate(rb)?;
                    self.arrays.replace_program(duplicated);
                }
                self.pc = rc;
            }
            Opcode::Orthography => {
                self.registers[instr.a as usize] = instr.immediate;
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{empty, sink, Cursor};

    fn machine(program: Vec<u32>) -> Machine<std::io::Empty, Vec<u8>> {
        Machine::new(program, empty(), Vec::new())
    }

    #[test]
    fn orthography_then_addition() {
        // r0 = 7, r1 = 3, r0 = r0 + r1 (A=0,B=0,C=1)
        let mut m = machine(vec![
            0xD000_0007,
            0xD200_0003,
            (3u32 << 28) | (0 << 6) | (0 << 3) | 1,
        ]);
        m.run().unwrap();
        assert_eq!(m.state(), MachineState::Halted);
        assert_eq!(m.registers()[0], 10);
        assert_eq!(m.registers()[1], 3);
    }

    #[test]
    fn empty_program_halts_immediately() {
        let mut m = machine(vec![]);
        m.run().unwrap();
        assert_eq!(m.state(), MachineState::Halted);
    }

    #[test]
    fn sole_halt_instruction_terminates_cleanly() {
        let mut m = machine(vec![7u32 << 28]);
        m.run().unwrap();
        assert_eq!(m.state(), MachineState::Halted);
    }

    #[test]
    fn division_by_zero_is_fatal() {
        // r1 = 0 via orthography (A=1), then Division A=0,B=0,C=1
        let program = vec![
            (13u32 << 28) | (1 << 25) | 0,
            (5u32 << 28) | (0 << 6) | (0 << 3) | 1,
        ];
        let mut m = Machine::new(program, empty(), sink());
        let err = m.run().unwrap_err();
        assert!(matches!(err, UmError::DivisionByZero));
        assert_eq!(m.state(), MachineState::Faulted);
    }

    #[test]
    fn hello_byte_goes_to_output() {
        let mut output = Vec::new();
        // r0 = 'H' (72) via orthography, then Output with C=0
        let program = vec![
            (13u32 << 28) | (0 << 25) | 72,
            (10u32 << 28) | (0 << 6) | (0 << 3) | 0,
        ];
        {
            let mut m = Machine::new(program, empty(), &mut output);
            m.run().unwrap();
            assert_eq!(m.state(), MachineState::Halted);
        }
        assert_eq!(output, vec![0x48]);
    }

    #[test]
    fn allocate_write_read_output_abandon_round_trip() {
        let program = vec![
            (13u32 << 28) | (2 << 25) | 5,           // r2 = 5
            (8u32 << 28) | (1 << 3) | 2,              // r1 = Allocate(r2)
            (13u32 << 28) | (3 << 25) | 0x41,         // r3 = 0x41 (value to write)
            (13u32 << 28) | (4 << 25) | 0,            // r4 = 0 (offset)
            (2u32 << 28) | (1 << 6) | (4 << 3) | 3,   // array[r1][r4] = r3
            (1u32 << 28) | (5 << 6) | (1 << 3) | 4,   // r5 = array[r1][r4]
            (10u32 << 28) | 5,                        // output r5
            (9u32 << 28) | 1,                         // abandon r1
            7u32 << 28,                                // halt
        ];
        let mut out = Vec::new();
        {
            let mut m = Machine::new(program, empty(), &mut out);
            m.run().unwrap();
            assert_eq!(m.state(), MachineState::Halted);
        }
        assert_eq!(out, vec![0x41]);
    }

    #[test]
    fn load_program_jump_in_place_does_not_duplicate() {
        // r1 = 3 (jump target: the word after the placeholder HALT), then
        // LoadProgram with B=0 (r0 is still 0, so no array is duplicated), C=1.
        let program = vec![
            (13u32 << 28) | (1 << 25) | 3, // r1 = 3
            (12u32 << 28) | (0 << 6) | (0 << 3) | 1, // LoadProgram B=r0(=0), C=r1(=3)
            7u32 << 28,                     // would halt if reached (it's skipped)
            (13u32 << 28) | (2 << 25) | 9,  // r2 = 9, the jump target
        ];
        let mut m = Machine::new(program, empty(), sink());
        m.run().unwrap();
        assert_eq!(m.registers()[2], 9);
        assert_eq!(m.state(), MachineState::Halted);
    }

    #[test]
    fn input_eof_sets_register_to_all_ones() {
        // Input opcode with C=0
        let program = vec![(11u32 << 28)];
        let mut m = Machine::new(program, Cursor::new(Vec::<u8>::new()), sink());
        m.run().unwrap();
        assert_eq!(m.registers()[0], 0xFFFF_FFFF);
    }

    #[test]
    fn input_reads_byte_zero_extended() {
        let program = vec![(11u32 << 28)];
        let mut m = Machine::new(program, Cursor::new(vec![0x41u8]), sink());
        m.run().unwrap();
        assert_eq!(m.registers()[0], 0x41);
    }

    #[test]
    fn arithmetic_wraps_modulo_2_32() {
        let program = vec![
            (13u32 << 28) | (1 << 25) | 0x01FF_FFFF, // r1 = max 25-bit immediate
            (4u32 << 28) | (0 << 6) | (1 << 3) | 1,  // r0 = r1 * r1 (wrapping)
            7u32 << 28,
        ];
        let mut m = Machine::new(program, empty(), sink());
        m.run().unwrap();
        let expected = 0x01FF_FFFFu32.wrapping_mul(0x01FF_FFFF);
        assert_eq!(m.registers()[0], expected);
    }

    #[test]
    fn conditional_move_leaves_target_unchanged_when_c_is_zero() {
        // r0 = 99 (sentinel), r1 = 5, r2 = 0 (C), ConditionalMove A=0,B=1,C=2.
        let program = vec![
            (13u32 << 28) | (0 << 25) | 99, // r0 = 99
            (13u32 << 28) | (1 << 25) | 5,  // r1 = 5
            (0u32 << 28) | (0 << 6) | (1 << 3) | 2, // r0 = rC != 0 ? r1 : r0
            7u32 << 28,
        ];
        let mut m = machine(program);
        m.run().unwrap();
        assert_eq!(m.registers()[0], 99);
    }

    #[test]
    fn not_and_complements_bitwise_and() {
        // r1 = 0b1100, r2 = 0b1010, r0 = !(r1 & r2) (A=0,B=1,C=2)
        let program = vec![
            (13u32 << 28) | (1 << 25) | 0b1100,
            (13u32 << 28) | (2 << 25) | 0b1010,
            (6u32 << 28) | (0 << 6) | (1 << 3) | 2,
            7u32 << 28,
        ];
        let mut m = machine(program);
        m.run().unwrap();
        assert_eq!(m.registers()[0], !0b1000u32);
    }

    #[test]
    fn self_modifying_code_is_observed_on_fetch() {
        // Word 4 starts as a HALT placeholder. Word 3 amends it in place to a
        // ConditionalMove that copies r6 into r7 (whose whole encoded word, opcode
        // 0, fits in a 25-bit immediate, so it can be built with Orthography).
        // If the fetch at word 4 observes the amendment, r7 ends up 42 instead of
        // the machine halting there unchanged.
        let conditional_move_r7_from_r6 = (7u32 << 6) | (6 << 3) | 6;
        let program = vec![
            (13u32 << 28) | (6 << 25) | 42,                  // r6 = 42
            (13u32 << 28) | (1 << 25) | 4,                   // r1 = 4 (offset to amend)
            (13u32 << 28) | (2 << 25) | conditional_move_r7_from_r6, // r2 = encoded instruction
            (2u32 << 28) | (0 << 6) | (1 << 3) | 2,          // array[0][r1] = r2
            7u32 << 28,                                      // placeholder; overwritten before fetch
        ];
        let mut m = Machine::new(program, empty(), sink());
        m.run().unwrap();
        assert_eq!(m.registers()[7], 42);
        assert_eq!(m.state(), MachineState::Halted);
    }
}
