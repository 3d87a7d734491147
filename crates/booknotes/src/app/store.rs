//! Ordered, in-memory collection of quotes and the edits users make to it.

use std::collections::BTreeSet;

use crate::app::parser::{HighlightParser, ParseOutcome};
use crate::domain::errors::StoreError;
use crate::domain::model::{CalloutType, IdAllocator, Quote, QuotePart};

/// Tracks quotes in display order and hands out identifiers for new ones.
#[derive(Debug, Default, Clone)]
pub struct QuoteStore {
    quotes: Vec<Quote>,
    ids: IdAllocator,
}

impl QuoteStore {
    /// Create an empty store with identifiers starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store drawing identifiers from `ids`.
    pub fn with_ids(ids: IdAllocator) -> Self {
        Self {
            quotes: Vec::new(),
            ids,
        }
    }

    /// Build a store around existing quotes, keeping future ids unique.
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        let mut ids = IdAllocator::default();
        for quote in &quotes {
            ids.observe(quote.id);
        }
        Self { quotes, ids }
    }

    /// Replace the contents with the quotes parsed from `text`.
    pub fn load(&mut self, text: &str, parser: &HighlightParser) -> ParseOutcome {
        let (outcome, quotes) = parser.parse_with_outcome(text, &mut self.ids);
        self.quotes = quotes;
        outcome
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get(&self, index: usize) -> Result<&Quote, StoreError> {
        let len = self.quotes.len();
        self.quotes
            .get(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }

    /// Flip the selection flag, returning the new value.
    pub fn toggle_select(&mut self, index: usize) -> Result<bool, StoreError> {
        let quote = self.get_mut(index)?;
        quote.selected = !quote.selected;
        Ok(quote.selected)
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<(), StoreError> {
        self.get_mut(index)?.selected = selected;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for quote in &mut self.quotes {
            quote.selected = false;
        }
    }

    /// Indices of selected quotes in display order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.quotes
            .iter()
            .enumerate()
            .filter(|(_, quote)| quote.selected)
            .map(|(index, _)| index)
            .collect()
    }

    /// Remove and return the quote at `index`.
    pub fn delete(&mut self, index: usize) -> Result<Quote, StoreError> {
        self.get(index)?;
        Ok(self.quotes.remove(index))
    }

    /// Overwrite the editable fields of a quote. References, parts and id are preserved.
    pub fn edit(
        &mut self,
        index: usize,
        highlight: &str,
        notes: &str,
        callout: CalloutType,
    ) -> Result<&Quote, StoreError> {
        let highlight = highlight.trim();
        if highlight.is_empty() {
            return Err(StoreError::EmptyHighlight);
        }
        let quote = self.get_mut(index)?;
        quote.highlight = highlight.to_string();
        quote.notes = notes.trim().to_string();
        quote.callout = callout;
        Ok(quote)
    }

    pub fn set_notes(&mut self, index: usize, notes: &str) -> Result<(), StoreError> {
        self.get_mut(index)?.notes = notes.trim().to_string();
        Ok(())
    }

    pub fn set_callout(&mut self, index: usize, callout: CalloutType) -> Result<(), StoreError> {
        self.get_mut(index)?.callout = callout;
        Ok(())
    }

    pub fn set_all_callouts(&mut self, callout: CalloutType) {
        for quote in &mut self.quotes {
            quote.callout = callout;
        }
    }

    /// Merge the quotes at `indices` into one, returning its position.
    ///
    /// Fragments keep the sources' display order regardless of the order indices were given
    /// in. The merged quote replaces the earliest source; the other sources are removed.
    pub fn merge(&mut self, indices: &[usize]) -> Result<usize, StoreError> {
        let len = self.quotes.len();
        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(&index) = unique.iter().find(|&&index| index >= len) {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        if unique.len() < 2 {
            return Err(StoreError::NotEnoughToMerge {
                found: unique.len(),
            });
        }

        let sources: Vec<&Quote> = unique.iter().map(|&index| &self.quotes[index]).collect();
        let parts: Vec<QuotePart> = sources.iter().flat_map(|quote| quote.fragments()).collect();
        let highlight = sources
            .iter()
            .map(|quote| quote.highlight.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let notes = sources
            .iter()
            .filter(|quote| !quote.notes.is_empty())
            .map(|quote| quote.notes.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let callout = sources[0].callout;

        let mut merged = Quote::new(self.ids.next_id(), highlight, notes, Vec::new(), callout);
        merged.parts = Some(parts);

        for &index in unique.iter().rev() {
            self.quotes.remove(index);
        }
        let position = *unique.first().unwrap_or(&0);
        tracing::debug!(
            sources = unique.len(),
            position,
            id = %merged.id,
            "merged quotes"
        );
        self.quotes.insert(position, merged);
        Ok(position)
    }

    /// Merge every selected quote.
    pub fn merge_selected(&mut self) -> Result<usize, StoreError> {
        let selected = self.selected_indices();
        self.merge(&selected)
    }

    /// Discard all quotes. Identifiers keep increasing.
    pub fn clear(&mut self) {
        self.quotes.clear();
    }

    pub fn with_notes_count(&self) -> usize {
        self.quotes.iter().filter(|quote| quote.has_notes()).count()
    }

    pub fn merged_count(&self) -> usize {
        self.quotes.iter().filter(|quote| quote.is_merged()).count()
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Quote, StoreError> {
        let len = self.quotes.len();
        self.quotes
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::QuoteId;

    fn quote(id: u64, highlight: &str, notes: &str, refs: &[&str]) -> Quote {
        Quote::new(
            QuoteId(id),
            highlight,
            notes,
            refs.iter().map(|r| r.to_string()).collect(),
            CalloutType::Note,
        )
    }

    fn sample_store() -> QuoteStore {
        QuoteStore::from_quotes(vec![
            quote(1, "first", "note one", &["^ref-1"]),
            quote(2, "second", "", &["^ref-2"]),
            quote(3, "third", "note three", &["^ref-3"]),
            quote(4, "fourth", "", &[]),
        ])
    }

    #[test]
    fn toggle_select_flips_flag() {
        let mut store = sample_store();
        assert!(store.toggle_select(1).unwrap());
        assert_eq!(store.selected_indices(), vec![1]);
        assert!(!store.toggle_select(1).unwrap());
        assert!(store.selected_indices().is_empty());
    }

    #[test]
    fn out_of_range_operations_fail_without_mutation() {
        let mut store = sample_store();
        assert_eq!(
            store.delete(9),
            Err(StoreError::IndexOutOfRange { index: 9, len: 4 })
        );
        assert!(store.toggle_select(4).is_err());
        assert!(store.edit(7, "x", "", CalloutType::Tip).is_err());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn edit_trims_and_preserves_references() {
        let mut store = sample_store();
        let edited = store
            .edit(0, "  new text \n", "\n fresh note ", CalloutType::Warning)
            .unwrap();
        assert_eq!(edited.highlight, "new text");
        assert_eq!(edited.notes, "fresh note");
        assert_eq!(edited.callout, CalloutType::Warning);
        assert_eq!(edited.location_refs, vec!["^ref-1".to_string()]);
        assert_eq!(edited.id, QuoteId(1));
    }

    #[test]
    fn edit_rejects_empty_highlight() {
        let mut store = sample_store();
        assert_eq!(
            store.edit(0, "   ", "n", CalloutType::Note).unwrap_err(),
            StoreError::EmptyHighlight
        );
        assert_eq!(store.quotes()[0].highlight, "first");
    }

    #[test]
    fn merge_uses_display_order_and_earliest_position() {
        let mut store = sample_store();
        store.set_callout(1, CalloutType::Danger).unwrap();
        let position = store.merge(&[3, 1]).unwrap();
        assert_eq!(position, 1);
        assert_eq!(store.len(), 3);

        let merged = &store.quotes()[1];
        assert!(merged.is_merged());
        assert!(merged.location_refs.is_empty());
        assert_eq!(merged.highlight, "second\n\nfourth");
        assert_eq!(merged.notes, "");
        assert_eq!(merged.callout, CalloutType::Danger);
        assert!(!merged.selected);
        let parts = merged.parts.as_ref().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].location_refs, vec!["^ref-2".to_string()]);
        assert!(parts[1].location_refs.is_empty());
        assert!(merged.id > QuoteId(4));

        let order: Vec<_> = store.quotes().iter().map(|q| q.id).collect();
        assert_eq!(order[0], QuoteId(1));
        assert_eq!(order[2], QuoteId(3));
    }

    #[test]
    fn merge_joins_non_empty_notes() {
        let mut store = sample_store();
        store.merge(&[0, 1, 2]).unwrap();
        assert_eq!(store.quotes()[0].notes, "note one\n\nnote three");
        assert_eq!(store.merged_count(), 1);
        assert_eq!(store.with_notes_count(), 1);
    }

    #[test]
    fn merge_requires_two_distinct_indices() {
        let mut store = sample_store();
        assert_eq!(
            store.merge(&[2, 2]),
            Err(StoreError::NotEnoughToMerge { found: 1 })
        );
        assert_eq!(
            store.merge_selected(),
            Err(StoreError::NotEnoughToMerge { found: 0 })
        );
        assert!(store.merge(&[0, 10]).is_err());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn merging_a_merged_quote_flattens_fragments() {
        let mut store = sample_store();
        store.merge(&[0, 1]).unwrap();
        store.merge(&[0, 1]).unwrap();
        let merged = &store.quotes()[0];
        let refs: Vec<_> = merged
            .parts
            .as_ref()
            .unwrap()
            .iter()
            .map(|part| part.location_refs.clone())
            .collect();
        assert_eq!(
            refs,
            vec![
                vec!["^ref-1".to_string()],
                vec!["^ref-2".to_string()],
                vec!["^ref-3".to_string()],
            ]
        );
        assert_eq!(merged.highlight, "first\n\nsecond\n\nthird");
    }

    #[test]
    fn merge_selected_clears_selection() {
        let mut store = sample_store();
        store.toggle_select(0).unwrap();
        store.toggle_select(2).unwrap();
        let position = store.merge_selected().unwrap();
        assert_eq!(position, 0);
        assert!(store.selected_indices().is_empty());
    }

    #[test]
    fn load_replaces_contents_with_fresh_ids() {
        let mut store = QuoteStore::new();
        let parser = HighlightParser::new(CalloutType::Info);
        assert_eq!(store.load("a\n---\nb", &parser), ParseOutcome::Parsed(2));
        let first_ids: Vec<_> = store.quotes().iter().map(|q| q.id).collect();
        store.load("c", &parser);
        assert_eq!(store.len(), 1);
        assert!(!first_ids.contains(&store.quotes()[0].id));
    }
}
