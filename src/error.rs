//! Fatal conditions that can terminate a running [`Machine`](crate::engine::Machine).
//!
//! Every variant here corresponds to one of the "Fatal conditions" enumerated in the
//! machine's error handling design: division by zero, an unrecognized opcode, an
//! out-of-range array access, a reference to an identifier that isn't live, a
//! misaligned program image, or an I/O failure that isn't a clean end-of-input.
//! End-of-input on the `Input` opcode is deliberately *not* represented here: it is
//! reported in-band (register C set to `0xFFFF_FFFF`), never as an `UmError`.

use thiserror::Error;

/// A word-addressed array identifier, as seen by the hosted program.
pub type ArrayId = u32;

/// A single fatal condition, reported once and terminating the machine.
#[derive(Debug, Error)]
pub enum UmError {
    /// Opcode 5 (Division) executed with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// The top 4 bits of a fetched word did not name one of the 14 defined opcodes.
    #[error("invalid opcode {opcode} at word {word:#010x}")]
    InvalidOpcode {
        /// The raw 4-bit value that failed to decode.
        opcode: u8,
        /// The full word it came from, for diagnostics.
        word: u32,
    },

    /// A read addressed an offset at or beyond the array's length.
    #[error("out-of-bounds read: array {array} has no offset {offset}")]
    OutOfBoundsRead {
        /// The array identifier that was read.
        array: ArrayId,
        /// The offending offset.
        offset: u32,
    },

    /// A write addressed an offset at or beyond the array's length.
    #[error("out-of-bounds write: array {array} has no offset {offset}")]
    OutOfBoundsWrite {
        /// The array identifier that was written.
        array: ArrayId,
        /// The offending offset.
        offset: u32,
    },

    /// A read, write, or abandon referenced an identifier that is not currently live.
    #[error("identifier {0} does not name a live array")]
    InvalidIdentifier(ArrayId),

    /// The program image's length was not a multiple of 4 bytes.
    #[error("program image truncated: {trailing} trailing byte(s) do not form a whole word")]
    ImageTruncated {
        /// How many bytes were left over after the last complete 4-byte word.
        trailing: usize,
    },

    /// A non-EOF error surfaced from the host's input or output stream.
    #[error("host I/O error during {operation}: {source}")]
    HostIo {
        /// Which direction failed, for logging; either `"read"` or `"write"`.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}
