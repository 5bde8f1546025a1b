//! Reads a program image — a flat byte stream whose length is a multiple of 4 — into
//! the big-endian 32-bit words that become array 0.
//!
//! Mirrors `original_source/computer.go`'s `Load`: read in 4-byte chunks, a clean
//! end-of-stream aligned on a word boundary is success, and a short final read that
//! isn't a whole word is a load-time error rather than a silently truncated program.

use std::io::Read;

use crate::error::UmError;

/// Reads `input` to completion and returns the words it encodes.
///
/// An empty stream yields an empty program (which halts immediately once loaded,
/// via the "fell off the end" rule — the loader itself does not treat this as an
/// error). A capacity hint pre-sizes the returned `Vec` when the image length is
/// known in advance; pass 0 if it isn't.
pub fn load_program<R: Read>(mut input: R, capacity_hint: usize) -> Result<Vec<u32>, UmError> {
    let mut words = Vec::with_capacity(capacity_hint);
    let mut buf = [0u8; 4];
    let mut filled = 0usize;

    loop {
        match input.read(&mut buf[filled..]) {
            Ok(0) => {
                return if filled == 0 {
                    Ok(words)
                } else {
                    Err(UmError::ImageTruncated { trailing: filled })
                };
            }
            Ok(n) => {
                filled += n;
                if filled == 4 {
                    words.push(u32::from_be_bytes(buf));
                    filled = 0;
                }
            }
            Err(source) if source.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(UmError::HostIo {
                    operation: "read",
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_program() {
        let words = load_program(std::io::empty(), 0).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn reads_big_endian_words_in_order() {
        let bytes = [0x00, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];
        let words = load_program(std::io::Cursor::new(bytes), 0).unwrap();
        assert_eq!(words, vec![1, 0xFFFF_FFFF]);
    }

    #[test]
    fn partial_trailing_group_is_an_error() {
        let bytes = [0x00, 0x00, 0x00, 0x01, 0xAB, 0xCD];
        let err = load_program(std::io::Cursor::new(bytes), 0).unwrap_err();
        assert!(matches!(err, UmError::ImageTruncated { trailing: 2 }));
    }

    #[test]
    fn capacity_hint_does_not_affect_result() {
        let bytes = [0x00, 0x00, 0x00, 0x2A];
        let words = load_program(std::io::Cursor::new(bytes), 16).unwrap();
        assert_eq!(words, vec![42]);
    }
}
