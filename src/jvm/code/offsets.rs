use crate::jvm::class_file::LocalVarRange;
use crate::jvm::Error;
use crate::util::{Offset, OffsetVec, Width};
use std::collections::HashMap;

/// Identifies a source construct (expression, declaration, catch clause) across the passes that
/// generate code for it and annotate it
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u32);

/// Instruction as seen by the tracker: only its width and which construct it came from matter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmittedInstruction {
    pub mnemonic: &'static str,
    pub width: usize,
    pub node: Option<NodeId>,
}

impl Width for EmittedInstruction {
    fn width(&self) -> usize {
        self.width
    }
}

/// Half-open range `[start_pc, end_pc)` during which a local occupies `slot`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiveRange {
    pub start_pc: u16,
    pub end_pc: u16,
    pub slot: u16,
}

impl From<LiveRange> for LocalVarRange {
    fn from(range: LiveRange) -> LocalVarRange {
        LocalVarRange {
            start_pc: range.start_pc,
            length: range.end_pc - range.start_pc,
            index: range.slot,
        }
    }
}

/// Records, while a method body is being generated, where the code for each construct landed
///
/// Code-level type annotation targets are expressed in terms of this information: the offset of
/// the `new`/`checkcast`/`instanceof`/`invoke*` instruction for an expression, the live ranges of
/// a local, or the exception table entry for a catch alternative.
#[derive(Debug)]
pub struct CodeOffsetTracker {
    code: OffsetVec<EmittedInstruction>,

    /// Offset of the first instruction emitted for each construct
    anchors: HashMap<NodeId, Offset>,

    /// Locals currently in scope: slot and where the current range started
    open_locals: HashMap<NodeId, (u16, Offset)>,

    /// Closed live ranges, in order
    live_ranges: HashMap<NodeId, Vec<LiveRange>>,

    /// Exception table index of each `(catch clause, alternative)` handler
    handlers: HashMap<(NodeId, usize), u16>,
    exception_table_len: u16,
}

impl CodeOffsetTracker {
    pub fn new() -> CodeOffsetTracker {
        CodeOffsetTracker {
            code: OffsetVec::new(),
            anchors: HashMap::new(),
            open_locals: HashMap::new(),
            live_ranges: HashMap::new(),
            handlers: HashMap::new(),
            exception_table_len: 0,
        }
    }

    /// Offset at which the next instruction will be emitted
    pub fn current_offset(&self) -> Offset {
        self.code.offset_len()
    }

    /// Record an emitted instruction
    ///
    /// The first instruction tagged with a given node becomes that node's anchor.
    pub fn emit(&mut self, mnemonic: &'static str, width: usize, node: Option<NodeId>) -> Offset {
        let offset = self.code.push(EmittedInstruction {
            mnemonic,
            width,
            node,
        });
        if let Some(node) = node {
            self.anchors.entry(node).or_insert(offset);
        }
        log::trace!("{:>5}: {} ({:?})", offset.0, mnemonic, node);
        offset
    }

    /// Start a live range for a local in the given slot
    pub fn open_local(&mut self, decl: NodeId, slot: u16) {
        let start = self.current_offset();
        self.open_locals.insert(decl, (slot, start));
    }

    /// End the current live range of a local
    ///
    /// Ranges that would be empty are dropped (the local was never live).
    pub fn close_local(&mut self, decl: NodeId) -> Result<(), Error> {
        let (slot, start) = self
            .open_locals
            .remove(&decl)
            .ok_or(Error::MissingLiveRange(decl))?;
        let end = self.current_offset();
        if end.0 > start.0 {
            let range = LiveRange {
                start_pc: bytecode_offset(start)?,
                end_pc: bytecode_offset(end)?,
                slot,
            };
            self.live_ranges.entry(decl).or_default().push(range);
        }
        Ok(())
    }

    /// Register the next exception table entry as the handler for one alternative of a catch
    /// clause, returning its index in the table
    pub fn add_exception_handler(
        &mut self,
        catch_clause: NodeId,
        alternative: usize,
    ) -> Result<u16, Error> {
        let index = self.exception_table_len;
        self.exception_table_len = index
            .checked_add(1)
            .ok_or(Error::IndexOverflow("exception table index", index as usize + 1))?;
        self.handlers.insert((catch_clause, alternative), index);
        Ok(index)
    }

    /// Byte offset of the instruction generated for a construct
    pub fn offset_for(&self, node: NodeId) -> Result<u16, Error> {
        let offset = self.anchors.get(&node).ok_or(Error::MissingCodeFor(node))?;
        bytecode_offset(*offset)
    }

    /// Every disjoint range during which a local was live, in code order
    pub fn live_ranges_for(&self, decl: NodeId) -> Result<Vec<LiveRange>, Error> {
        match self.live_ranges.get(&decl) {
            Some(ranges) if !ranges.is_empty() => {
                let mut ranges = ranges.clone();
                ranges.sort_by_key(|r| r.start_pc);
                Ok(ranges)
            }
            _ => Err(Error::MissingLiveRange(decl)),
        }
    }

    /// Exception table index of the handler for one alternative of a catch clause
    pub fn exception_table_index(
        &self,
        catch_clause: NodeId,
        alternative: usize,
    ) -> Result<u16, Error> {
        self.handlers
            .get(&(catch_clause, alternative))
            .copied()
            .ok_or(Error::MissingExceptionHandler {
                catch_clause,
                alternative,
            })
    }

    /// Instruction at a given offset (offsets inside an instruction give `None`)
    pub fn instruction_at(&self, offset: u16) -> Option<&EmittedInstruction> {
        self.code.get_offset(Offset(offset as usize))
    }
}

impl Default for CodeOffsetTracker {
    fn default() -> Self {
        CodeOffsetTracker::new()
    }
}

fn bytecode_offset(offset: Offset) -> Result<u16, Error> {
    u16::try_from(offset.0).map_err(|_| Error::IndexOverflow("bytecode offset", offset.0))
}
