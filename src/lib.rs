//! ## Overview
//! This crate interprets programs written for a minimal 32-bit word-oriented
//! abstract computer, historically known as the "Universal Machine" from the 2006
//! ICFP programming contest. A program is a flat sequence of big-endian 32-bit
//! words; the machine loads it into array 0 and executes it word by word from
//! offset zero, driving eight general-purpose registers and a dynamically managed
//! collection of secondary arrays until it halts, falls off the end of its program,
//! or hits a fatal condition.
//!
//! ## Architecture
//! Three pieces cooperate, leaves-first:
//!
//! - [`decoder`] decodes one 32-bit word into an opcode and its operand fields. It
//!   is a pure function with no knowledge of machine state.
//! - [`arrays`] owns every array the running program can see, including array 0,
//!   the active program itself. It hands out opaque identifiers on allocation and
//!   recycles them on abandonment.
//! - [`engine`] owns the registers and the program counter, drives the
//!   fetch-decode-execute loop, and is the only piece that talks to the host's byte
//!   streams.
//!
//! [`loader`] sits outside that loop: it turns a byte stream into the words that
//! become array 0 before a [`Machine`](engine::Machine) is ever constructed.
//!
//! ## Memory model
//! All 2^32 possible array identifiers are either *live* (currently allocated) or
//! not; identifier 0 is always live and denotes the active program. A program can
//! allocate new arrays, read and write them by index, abandon them to recycle their
//! identifiers, and replace its own active program with a copy of any other live
//! array's contents — the mechanism by which self-decrypting and self-modifying
//! programs work. Ownership is strict: the array table is the sole owner of every
//! array's storage, and registers only ever hold identifiers or raw words, never
//! ownership.
//!
//! ## Arithmetic
//! Every arithmetic operation is unsigned and modulo 2^32; there is no overflow
//! trap anywhere in this instruction set.
//!
//! ## What this crate does not do
//! There is no JIT, no debugger, no sandboxing of the hosted program, and no
//! concurrency inside a single [`Machine`](engine::Machine) instance. Nothing about
//! machine state persists across process runs.

pub mod arrays;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod loader;

pub use arrays::ArrayTable;
pub use decoder::{decode, Instruction, Opcode};
pub use engine::{Machine, MachineState};
pub use error::UmError;
pub use loader::load_program;
