//! Hover and location side tables (component 10, §6 "External interfaces" —
//! the language-server's hover and go-to-definition queries run against
//! these, not against the typed tree directly).

use std::collections::HashMap;

use crate::span::Span;
use crate::typed_ast::SpanTable;

/// Text to show when hovering over the source range at `span` — typically
/// `"<name>: <type>"` for an identifier, or a function's full signature.
pub type HoverTable = SpanTable<String>;

/// Maps a reference's span to the span of the declaration it resolves to
/// (go-to-definition). Declarations map to themselves, so a lookup always
/// succeeds once pass 1/2 have run for a resolvable name.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    definition_of: SpanTable<Span>,
    references_of: HashMap<(usize, usize, usize), Vec<Span>>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reference(&mut self, reference: Span, definition: Span) {
        let key = (definition.line, definition.column, definition.length);
        self.references_of
            .entry(key)
            .or_default()
            .push(reference.clone());
        self.definition_of.insert(reference, definition);
    }

    pub fn definition_of(&mut self, reference: &Span) -> Option<Span> {
        self.definition_of.get(reference).cloned()
    }

    pub fn references_to(&self, definition: &Span) -> &[Span] {
        let key = (definition.line, definition.column, definition.length);
        self.references_of
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn span(line: usize, column: usize, length: usize) -> Span {
        Span::new(Rc::from("t.fe"), line, column, length)
    }

    #[test]
    fn references_accumulate_per_definition() {
        let mut table = LocationTable::new();
        let def = span(1, 7, 3);
        table.record_reference(span(4, 1, 3), def.clone());
        table.record_reference(span(8, 5, 3), def.clone());
        assert_eq!(table.references_to(&def).len(), 2);
    }

    #[test]
    fn definition_of_resolves_a_reference() {
        let mut table = LocationTable::new();
        let def = span(1, 7, 3);
        let reference = span(4, 1, 3);
        table.record_reference(reference.clone(), def.clone());
        assert_eq!(table.definition_of(&reference), Some(def));
    }
}
