use std::cell::RefCell;
use std::rc::Rc;

use crate::position::Position;
use crate::symbol_table::SymbolTable;

/// A single call activation. Functions capture the `Context` that was active
/// at their definition site (not the call site), which is what gives them
/// lexical rather than dynamic scoping.
#[derive(Debug, Clone)]
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    pub parent_entry_pos: Option<Position>,
    pub symbol_table: Rc<RefCell<SymbolTable>>,
}

impl Context {
    pub fn new(
        display_name: impl Into<String>,
        parent: Option<Rc<Context>>,
        parent_entry_pos: Option<Position>,
        symbol_table: Rc<RefCell<SymbolTable>>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            parent,
            parent_entry_pos,
            symbol_table,
        }
    }
}
