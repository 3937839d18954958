use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use docqa_core::types::{DocId, IndexedDocument, SearchHit};

use crate::tantivy_utils::{build_schema, register_tokenizer, tokenize, LexicalFields};

const WRITER_MEMORY_BYTES: usize = 20_000_000;

/// In-memory lexical copy of every indexed chunk, scored with BM25.
///
/// The document list is authoritative. The tantivy RAM index is rebuilt from
/// it after every mutation, so corpus statistics never include deleted chunks.
/// A mutation either installs a fully built index or leaves the corpus as it
/// was.
#[derive(Default)]
pub struct LexicalCorpus {
    docs: Vec<IndexedDocument>,
    positions: HashMap<DocId, usize>,
    index: Option<LexicalIndex>,
}

struct LexicalIndex {
    reader: IndexReader,
    fields: LexicalFields,
}

impl LexicalCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.positions.get(id).map(|&i| &self.docs[i])
    }

    pub fn documents(&self) -> &[IndexedDocument] {
        &self.docs
    }

    /// Distinct sources, sorted.
    pub fn sources(&self) -> Vec<String> {
        self.docs
            .iter()
            .map(|d| d.metadata.source.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn ids_for_source(&self, source: &str) -> Vec<DocId> {
        self.docs.iter().filter(|d| d.metadata.source == source).map(|d| d.id.clone()).collect()
    }

    /// Append documents; an id already present is replaced in place.
    pub fn add(&mut self, documents: Vec<IndexedDocument>) -> Result<()> {
        let mut next = self.docs.clone();
        merge_into(&mut next, documents);
        self.install(next)
    }

    /// Drop every document of `source`. Returns how many were removed.
    pub fn remove_source(&mut self, source: &str) -> Result<usize> {
        self.replace_source(source, Vec::new())
    }

    /// Drop `source`'s documents and append `documents` in one step.
    /// Returns how many documents were removed.
    pub fn replace_source(&mut self, source: &str, documents: Vec<IndexedDocument>) -> Result<usize> {
        let mut next: Vec<IndexedDocument> = self.docs.iter().filter(|d| d.metadata.source != source).cloned().collect();
        let removed = self.docs.len() - next.len();
        if removed == 0 && documents.is_empty() {
            return Ok(0);
        }
        merge_into(&mut next, documents);
        self.install(next)?;
        debug!(source, removed, total = self.docs.len(), "replaced lexical documents");
        Ok(removed)
    }

    /// BM25 search. Only hits with a positive score are returned, best first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let Some(index) = &self.index else { return Ok(Vec::new()) };
        let limit = limit.min(self.docs.len());
        if limit == 0 {
            return Ok(Vec::new());
        }
        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|t| {
                let term = Term::from_field_text(index.fields.text, t);
                let q: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, q)
            })
            .collect();
        let q = BooleanQuery::new(clauses);

        let searcher = index.reader.searcher();
        let top_docs = searcher.search(&q, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            if score <= 0.0 {
                continue;
            }
            let doc: TantivyDocument = searcher.doc(addr)?;
            let id = doc.get_first(index.fields.id).and_then(|v| v.as_str()).unwrap_or("").to_string();
            hits.push(SearchHit { id, score });
        }
        Ok(hits)
    }

    fn install(&mut self, docs: Vec<IndexedDocument>) -> Result<()> {
        let index = build_index(&docs)?;
        self.positions = docs.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect();
        self.docs = docs;
        self.index = index;
        Ok(())
    }
}

fn merge_into(target: &mut Vec<IndexedDocument>, documents: Vec<IndexedDocument>) {
    let mut positions: HashMap<DocId, usize> = target.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect();
    for doc in documents {
        if let Some(&i) = positions.get(&doc.id) {
            target[i] = doc;
        } else {
            positions.insert(doc.id.clone(), target.len());
            target.push(doc);
        }
    }
}

fn build_index(docs: &[IndexedDocument]) -> Result<Option<LexicalIndex>> {
    if docs.is_empty() {
        return Ok(None);
    }
    let (schema, fields) = build_schema();
    let index = Index::create_in_ram(schema);
    register_tokenizer(&index);
    let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
    for d in docs {
        writer.add_document(doc!(
            fields.id => d.id.clone(),
            fields.text => d.text.clone(),
        ))?;
    }
    writer.commit()?;
    let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
    Ok(Some(LexicalIndex { reader, fields }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::DocMetadata;

    fn doc(source: &str, n: usize, text: &str) -> IndexedDocument {
        let chunk_id = format!("chunk_{n}");
        IndexedDocument {
            id: format!("{source}::{chunk_id}"),
            text: text.to_string(),
            metadata: DocMetadata { source: source.to_string(), locator: "document".to_string(), chunk_id },
        }
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let corpus = LexicalCorpus::new();
        assert!(corpus.is_empty());
        assert!(corpus.search("anything", 10).unwrap().is_empty());
    }

    #[test]
    fn bm25_prefers_documents_with_query_terms() {
        let mut corpus = LexicalCorpus::new();
        corpus
            .add(vec![
                doc("a.txt", 0, "the quick brown fox"),
                doc("a.txt", 1, "solar panels convert sunlight into electricity"),
                doc("a.txt", 2, "a lazy dog sleeps"),
            ])
            .unwrap();

        let hits = corpus.search("Solar electricity", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a.txt::chunk_1");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn query_without_matches_or_tokens_is_empty() {
        let mut corpus = LexicalCorpus::new();
        corpus.add(vec![doc("a.txt", 0, "alpha bravo")]).unwrap();
        assert!(corpus.search("zulu", 10).unwrap().is_empty());
        assert!(corpus.search("?!", 10).unwrap().is_empty());
        assert!(corpus.search("alpha", 0).unwrap().is_empty());
    }

    #[test]
    fn huge_limit_is_capped_at_corpus_size() {
        let mut corpus = LexicalCorpus::new();
        corpus.add(vec![doc("a.txt", 0, "pump check"), doc("a.txt", 1, "pump oil"), doc("a.txt", 2, "filter")]).unwrap();
        let hits = corpus.search("pump", usize::MAX).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn replace_source_swaps_only_that_source() {
        let mut corpus = LexicalCorpus::new();
        corpus.add(vec![doc("a.txt", 0, "old alpha"), doc("a.txt", 1, "old bravo"), doc("b.txt", 0, "keep me")]).unwrap();

        let removed = corpus.replace_source("a.txt", vec![doc("a.txt", 0, "new charlie")]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.ids_for_source("a.txt"), vec!["a.txt::chunk_0"]);
        assert!(corpus.search("old", 10).unwrap().is_empty());
        assert_eq!(corpus.search("charlie", 10).unwrap()[0].id, "a.txt::chunk_0");
        assert_eq!(corpus.get("b.txt::chunk_0").map(|d| d.text.as_str()), Some("keep me"));
    }

    #[test]
    fn remove_source_and_sources_listing() {
        let mut corpus = LexicalCorpus::new();
        corpus.add(vec![doc("b.txt", 0, "x"), doc("a.txt", 0, "y"), doc("b.txt", 1, "z")]).unwrap();
        assert_eq!(corpus.sources(), vec!["a.txt", "b.txt"]);

        assert_eq!(corpus.remove_source("b.txt").unwrap(), 2);
        assert_eq!(corpus.remove_source("missing").unwrap(), 0);
        assert_eq!(corpus.sources(), vec!["a.txt"]);
    }

    #[test]
    fn adding_existing_id_replaces_it() {
        let mut corpus = LexicalCorpus::new();
        corpus.add(vec![doc("a.txt", 0, "first")]).unwrap();
        corpus.add(vec![doc("a.txt", 0, "second")]).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get("a.txt::chunk_0").map(|d| d.text.as_str()), Some("second"));
    }
}
