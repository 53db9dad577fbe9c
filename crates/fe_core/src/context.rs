//! Compilation context (§2, §5 "Concurrency & resource model").
//!
//! Owns the permanent arena for one compilation unit: the symbol table, the
//! error-domain table, the type/string intern pools, and the side tables the
//! typed output is built around. The scratch arena is simply the owned
//! untyped [`Module`](crate::ast::Module) handed into `analyze` and dropped
//! once [`TypedModule`] is produced (§10.5) — there is no separate arena
//! type for it.

use std::rc::Rc;

use crate::diagnostics::DiagnosticsCollector;
use crate::domains::DomainTable;
use crate::sidetables::{HoverTable, LocationTable};
use crate::symbols::Scope;
use crate::types::InternPool;

/// One compilation unit: one file, one context, one pass over the pipeline
/// (§5 — no sharing of a context across compilation units, no concurrency
/// within one).
pub struct CompilationContext {
    pub file: Rc<str>,
    pub scope: Scope,
    pub domains: DomainTable,
    pub interner: InternPool,
    pub diagnostics: DiagnosticsCollector,
    pub hover: HoverTable,
    pub locations: LocationTable,
}

impl CompilationContext {
    pub fn new(file: impl Into<Rc<str>>, source: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            scope: Scope::new(),
            domains: DomainTable::new(),
            interner: InternPool::new(),
            diagnostics: DiagnosticsCollector::new(source),
            hover: HoverTable::new(),
            locations: LocationTable::new(),
        }
    }
}
