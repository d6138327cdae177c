use std::fmt::{Debug, Error, Formatter};
use std::iter::Enumerate;
use std::result::Result;
use std::slice::Iter;

/// Elements with a width (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// Two places in this crate need exactly this:
///
///   - the constants pool (most entries have width 1, but `long` and `double` have width 2)
///   - emitted method code, where the offset of an instruction is the sum of the byte widths of
///     every instruction emitted before it
///
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector
    pub fn new() -> OffsetVec<T> {
        OffsetVec::new_starting_at(Offset(0))
    }

    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
        }
    }

    /// Offset of the next element to be added
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back, returning the offset at which it landed
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width();
        self.entries.push((offset, slot));

        offset
    }

    /// Get an entry by its offset in the vector
    ///
    /// Offsets falling in the middle of a wide entry (or past the end) produce `None`.
    pub fn get_offset(&self, offset: Offset) -> Option<&T> {
        self.entries
            .binary_search_by_key(&offset, |(off, _)| *off)
            .ok()
            .map(|found_idx| &self.entries[found_idx].1)
    }
}

impl<A: PartialEq> PartialEq for OffsetVec<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<A: Width> Default for OffsetVec<A> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

/// Iterator for borrowed `OffsetVec`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> IntoIterator for &'a OffsetVec<T> {
    type Item = (Offset, usize, &'a T);
    type IntoIter = OffsetVecIter<'a, T>;

    fn into_iter(self) -> OffsetVecIter<'a, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Stand-in for an emitted instruction of a given byte length
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    struct Insn(&'static str, usize);

    impl Width for Insn {
        fn width(&self) -> usize {
            self.1
        }
    }

    #[test]
    fn offsets_are_byte_sums() {
        let mut code: OffsetVec<Insn> = OffsetVec::new();
        for insn in [
            Insn("new", 3),
            Insn("dup", 1),
            Insn("invokespecial", 3),
            Insn("astore_1", 1),
            Insn("aload_1", 1),
            Insn("instanceof", 3),
        ] {
            code.push(insn);
        }

        let offsets: Vec<(usize, &str)> = (&code)
            .into_iter()
            .map(|(off, _, i)| (off.0, i.0))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (0, "new"),
                (3, "dup"),
                (4, "invokespecial"),
                (7, "astore_1"),
                (8, "aload_1"),
                (9, "instanceof"),
            ]
        );
        assert_eq!(code.offset_len(), Offset(12));
    }

    #[test]
    fn lookup_inside_wide_entry_fails() {
        let mut code: OffsetVec<Insn> = OffsetVec::new_starting_at(Offset(1));
        code.push(Insn("checkcast", 3));
        code.push(Insn("areturn", 1));

        assert_eq!(code.get_offset(Offset(1)), Some(&Insn("checkcast", 3)));
        assert_eq!(code.get_offset(Offset(2)), None, "middle of checkcast");
        assert_eq!(code.get_offset(Offset(4)), Some(&Insn("areturn", 1)));
        assert_eq!(code.get_offset(Offset(5)), None, "past the end");
    }
}
