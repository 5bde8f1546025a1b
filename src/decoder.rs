//! ## Instruction Set Summary
//!
//! Every word fetched from the active program names one of 14 operations. Thirteen
//! of them (0 through 12) share a **standard** encoding: a 4-bit opcode in the high
//! bits followed by three 3-bit register operands, A, B and C, with 19 unused bits
//! in between. The fourteenth, Orthography, instead packs a 3-bit register operand
//! and a 25-bit immediate into the low 28 bits — it is the only way to get a literal
//! value into a register.
//!
//! ```text
//! standard:     [ opcode:4 | unused:19 | A:3 | B:3 | C:3 ]
//! orthography:  [ opcode:4 | A:3 | immediate:25         ]
//! ```
//!
//! Any opcode value outside 0..=13 is a decode-time fault; this machine has no NOP
//! fallback for unassigned opcodes, unlike stack-machine relatives that map unknown
//! bit patterns to a no-op so that any bit pattern is a legal program.

use crate::error::UmError;

/// The 14 operations a decoded word can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Conditional move: `if rC != 0 { A = rB }`.
    ConditionalMove = 0,
    /// Array index: `A = array[rB][rC]`.
    ArrayIndex = 1,
    /// Array amendment: `array[rA][rB] = rC`.
    ArrayAmendment = 2,
    /// Addition modulo 2^32.
    Addition = 3,
    /// Multiplication modulo 2^32.
    Multiplication = 4,
    /// Unsigned division, floor division; `rC == 0` is fatal.
    Division = 5,
    /// Bitwise NOT of `rB & rC`.
    NotAnd = 6,
    /// Stop execution and return normally.
    Halt = 7,
    /// Allocate a new array of `rC` words, all zero; `B` receives its identifier.
    Allocation = 8,
    /// Free the array named by `rC`, recycling its identifier.
    Abandonment = 9,
    /// Emit the low 8 bits of `rC` as one byte.
    Output = 10,
    /// Read one byte into `C`, or `0xFFFF_FFFF` on end-of-input.
    Input = 11,
    /// Replace array 0 with a copy of array `rB` (if nonzero), then jump to `rC`.
    LoadProgram = 12,
    /// Load a 25-bit immediate into the register named by the special A field.
    Orthography = 13,
}

impl Opcode {
    /// Maps a raw 4-bit value to its [`Opcode`], or `None` if it doesn't name one.
    fn from_raw(raw: u8) -> Option<Self> {
        use Opcode::*;
        Some(match raw {
            0 => ConditionalMove,
            1 => ArrayIndex,
            2 => ArrayAmendment,
            3 => Addition,
            4 => Multiplication,
            5 => Division,
            6 => NotAnd,
            7 => Halt,
            8 => Allocation,
            9 => Abandonment,
            10 => Output,
            11 => Input,
            12 => LoadProgram,
            13 => Orthography,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::ConditionalMove => "ConditionalMove",
            Opcode::ArrayIndex => "ArrayIndex",
            Opcode::ArrayAmendment => "ArrayAmendment",
            Opcode::Addition => "Addition",
            Opcode::Multiplication => "Multiplication",
            Opcode::Division => "Division",
            Opcode::NotAnd => "NotAnd",
            Opcode::Halt => "Halt",
            Opcode::Allocation => "Allocation",
            Opcode::Abandonment => "Abandonment",
            Opcode::Output => "Output",
            Opcode::Input => "Input",
            Opcode::LoadProgram => "LoadProgram",
            Opcode::Orthography => "Orthography",
        };
        f.write_str(name)
    }
}

/// A decoded view of one fetched word.
///
/// `a`, `b` and `c` are always populated as 3-bit register indices (0..=7); for
/// [`Opcode::Orthography`] only `a` and `immediate` are meaningful, `b`/`c` are 0.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub immediate: u32,
}

/// Decodes one 32-bit word into its instruction fields.
///
/// Pure and stateless: the same word always decodes the same way, independent of
/// any machine state. Fails with [`UmError::InvalidOpcode`] if the top 4 bits don't
/// name one of the 14 defined opcodes.
#[inline]
pub fn decode(word: u32) -> Result<Instruction, UmError> {
    let raw_opcode = (word >> 28) as u8;
    let opcode = Opcode::from_raw(raw_opcode).ok_or(UmError::InvalidOpcode {
        opcode: raw_opcode,
        word,
    })?;

    if let Opcode::Orthography = opcode {
        let a = ((word >> 25) & 0b111) as u8;
        let immediate = word & 0x01FF_FFFF;
        Ok(Instruction {
            opcode,
            a,
            b: 0,
            c: 0,
            immediate,
        })
    } else {
        let a = ((word >> 6) & 0b111) as u8;
        let b = ((word >> 3) & 0b111) as u8;
        let c = (word & 0b111) as u8;
        Ok(Instruction {
            opcode,
            a,
            b,
            c,
            immediate: 0,
        })
    }
}
