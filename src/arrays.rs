//! Owner of every array the hosted program can see, including array 0, the active
//! program itself.
//!
//! Programs in this instruction set allocate and abandon arrays heavily — millions
//! of times over a long-running program is routine — so identifier density and
//! `arrays[id]` lookup locality are the dominant performance concern of this module.
//! [`ArrayTable`] realizes the arena-plus-freelist strategy the machine's design
//! notes call out directly: a dense, indexable `Vec` of slots, each either holding an
//! array or `None`, paired with a LIFO stack of indices freed by abandonment.
//! Allocation pops a free index if one exists and otherwise extends the arena;
//! abandonment clears the slot and pushes its index back onto the freelist. Both
//! operations are O(1) amortized, and identifier 0 — touched on every single fetch —
//! never moves.

use crate::error::{ArrayId, UmError};

/// One word-addressed array. A fresh allocation is all zeros; length is fixed for
/// the array's lifetime.
pub type Array = Vec<u32>;

/// Owner of all arrays, keyed by opaque identifier. Identifier 0 is always live and
/// denotes the active program.
#[derive(Debug)]
pub struct ArrayTable {
    slots: Vec<Option<Array>>,
    free: Vec<ArrayId>,
}

impl ArrayTable {
    /// Builds a table whose array 0 is `program`.
    pub fn new(program: Array) -> Self {
        ArrayTable {
            slots: vec![Some(program)],
            free: Vec::new(),
        }
    }

    /// Builds a table with `capacity_hint` pre-reserved slots, for programs expected
    /// to allocate heavily. Only array 0 is initially live.
    pub fn with_capacity(program: Array, capacity_hint: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity_hint.max(1));
        slots.push(Some(program));
        ArrayTable {
            slots,
            free: Vec::new(),
        }
    }

    /// The active program, array 0.
    pub fn program(&self) -> &Array {
        // Slot 0 is populated at construction and never freed (abandoning id 0 is
        // fatal, see `abandon`), so this is always `Some`; no hosted-program input
        // can violate it. Checked only in debug builds, since this is read on every fetch.
        debug_assert!(self.slots[0].is_some(), "array 0 is always live");
        unsafe { self.slots.get_unchecked(0).as_ref().unwrap_unchecked() }
    }

    fn slot(&self, id: ArrayId) -> Result<&Array, UmError> {
        self.slots
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or(UmError::InvalidIdentifier(id))
    }

    fn slot_mut(&mut self, id: ArrayId) -> Result<&mut Array, UmError> {
        self.slots
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(UmError::InvalidIdentifier(id))
    }

    /// Reads the word at `offset` within array `id`.
    pub fn read(&self, id: ArrayId, offset: u32) -> Result<u32, UmError> {
        let array = self.slot(id)?;
        array
            .get(offset as usize)
            .copied()
            .ok_or(UmError::OutOfBoundsRead { array: id, offset })
    }

    /// Writes `value` at `offset` within array `id`. `id == 0` is permitted and is
    /// the mechanism for self-modifying code.
    pub fn write(&mut self, id: ArrayId, offset: u32, value: u32) -> Result<(), UmError> {
        let array = self.slot_mut(id)?;
        match array.get_mut(offset as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(UmError::OutOfBoundsWrite { array: id, offset }),
        }
    }

    /// Allocates a new zero-initialized array of `size` words and returns its
    /// identifier. The identifier is always nonzero and not currently live.
    pub fn allocate(&mut self, size: u32) -> ArrayId {
        let array = vec![0u32; size as usize];
        if let Some(id) = self.free.pop() {
            self.slots[id as usize] = Some(array);
            id
        } else {
            let id = self.slots.len() as ArrayId;
            self.slots.push(Some(array));
            id
        }
    }

    /// Frees array `id`, recycling its identifier for a future allocation. `id == 0`
    /// and abandoning a non-live identifier are both fatal.
    pub fn abandon(&mut self, id: ArrayId) -> Result<(), UmError> {
        if id == 0 {
            return Err(UmError::InvalidIdentifier(id));
        }
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or(UmError::InvalidIdentifier(id))?;
        if slot.take().is_none() {
            return Err(UmError::InvalidIdentifier(id));
        }
        self.free.push(id);
        Ok(())
    }

    /// Returns a copy of array `id`'s contents, leaving it untouched. Used to install
    /// a new active program via `LoadProgram`.
    pub fn duplicate(&self, id: ArrayId) -> Result<Array, UmError> {
        self.slot(id).cloned()
    }

    /// Replaces array 0 wholesale with `program`.
    pub fn replace_program(&mut self, program: Array) {
        self.slots[0] = Some(program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_yields_nonzero_zeroed_array() {
        let mut table = ArrayTable::new(vec![0; 4]);
        let id = table.allocate(5);
        assert_ne!(id, 0);
        assert_eq!(table.slot(id).unwrap().as_slice(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn allocate_of_zero_size_is_allowed() {
        let mut table = ArrayTable::new(vec![0; 1]);
        let id = table.allocate(0);
        assert_eq!(table.slot(id).unwrap().len(), 0);
    }

    #[test]
    fn abandon_then_reuse_recycles_identifier() {
        let mut table = ArrayTable::new(vec![0; 1]);
        let id = table.allocate(3);
        table.abandon(id).unwrap();
        assert!(table.read(id, 0).is_err());

        let reused = table.allocate(2);
        assert_eq!(reused, id);
        assert_eq!(table.slot(reused).unwrap().len(), 2);
    }

    #[test]
    fn abandon_of_zero_is_fatal() {
        let mut table = ArrayTable::new(vec![0; 1]);
        assert!(matches!(
            table.abandon(0),
            Err(UmError::InvalidIdentifier(0))
        ));
    }

    #[test]
    fn abandon_of_non_live_identifier_is_fatal() {
        let mut table = ArrayTable::new(vec![0; 1]);
        assert!(table.abandon(7).is_err());
    }

    #[test]
    fn write_to_zero_mutates_active_program() {
        let mut table = ArrayTable::new(vec![0; 2]);
        table.write(0, 1, 0xdead_beef).unwrap();
        assert_eq!(table.program()[1], 0xdead_beef);
    }

    #[test]
    fn out_of_bounds_access_is_fatal() {
        let table = ArrayTable::new(vec![0; 2]);
        assert!(matches!(
            table.read(0, 2),
            Err(UmError::OutOfBoundsRead { array: 0, offset: 2 })
        ));
    }

    #[test]
    fn duplicate_does_not_modify_source() {
        let mut table = ArrayTable::new(vec![0; 1]);
        let id = table.allocate(3);
        table.write(id, 0, 42).unwrap();
        let copy = table.duplicate(id).unwrap();
        assert_eq!(copy, vec![42, 0, 0]);

        table.replace_program(copy);
        table.write(0, 0, 99).unwrap();
        assert_eq!(table.read(id, 0).unwrap(), 42);
    }
}
