use std::collections::HashMap;

use docqa_core::types::DocId;
use docqa_text::{token_set, LexicalCorpus};

/// Standard constant for reciprocal rank fusion.
pub const DEFAULT_RRF_K: usize = 60;

/// Merge several rankings into one: each list contributes `1 / (k + rank)` to
/// every id it contains, rank starting at 1. Ties keep first-seen order.
pub fn reciprocal_rank_fusion(rankings: &[Vec<DocId>], k: usize) -> Vec<DocId> {
    let mut order: Vec<(DocId, f64)> = Vec::new();
    let mut slot: HashMap<DocId, usize> = HashMap::new();
    for ranking in rankings {
        for (i, id) in ranking.iter().enumerate() {
            let contribution = 1.0 / (k as f64 + (i + 1) as f64);
            match slot.get(id) {
                Some(&s) => order[s].1 += contribution,
                None => {
                    slot.insert(id.clone(), order.len());
                    order.push((id.clone(), contribution));
                }
            }
        }
    }
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    order.into_iter().map(|(id, _)| id).collect()
}

/// Reorder by how many distinct query tokens each document contains.
/// Ids missing from the corpus count as zero overlap. Stable, so equal counts
/// keep their incoming order.
pub fn rerank_by_overlap(query: &str, ids: Vec<DocId>, corpus: &LexicalCorpus, limit: usize) -> Vec<DocId> {
    let q_words = token_set(query);
    let mut scored: Vec<(DocId, usize)> = ids
        .into_iter()
        .map(|id| {
            let overlap = corpus.get(&id).map_or(0, |doc| token_set(&doc.text).intersection(&q_words).count());
            (id, overlap)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(limit).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::{DocMetadata, IndexedDocument};

    fn ids(v: &[&str]) -> Vec<DocId> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shared_top_hit_beats_single_list_hits() {
        let fused = reciprocal_rank_fusion(&[ids(&["a", "b", "c"]), ids(&["a", "d"])], DEFAULT_RRF_K);
        assert_eq!(fused[0], "a");
        assert_eq!(fused.len(), 4);
    }

    #[test]
    fn fusion_ties_keep_first_seen_order() {
        // b and x both sit at rank 2 of a single list
        let fused = reciprocal_rank_fusion(&[ids(&["a", "b"]), ids(&["a", "x"])], DEFAULT_RRF_K);
        assert_eq!(fused, ids(&["a", "b", "x"]));
    }

    #[test]
    fn single_list_order_is_preserved() {
        let fused = reciprocal_rank_fusion(&[ids(&["c", "a", "b"])], DEFAULT_RRF_K);
        assert_eq!(fused, ids(&["c", "a", "b"]));
    }

    #[test]
    fn overlap_rerank_is_stable() {
        let mut corpus = LexicalCorpus::new();
        let docs = [("s::0", "nothing here"), ("s::1", "solar battery bank"), ("s::2", "also nothing"), ("s::3", "battery")];
        corpus
            .add(
                docs.iter()
                    .map(|(id, text)| IndexedDocument {
                        id: id.to_string(),
                        text: text.to_string(),
                        metadata: DocMetadata { source: "s".into(), locator: "document".into(), chunk_id: id[3..].to_string() },
                    })
                    .collect(),
            )
            .unwrap();

        let out = rerank_by_overlap("Solar battery?", ids(&["s::0", "s::1", "missing", "s::2", "s::3"]), &corpus, 10);
        assert_eq!(out, ids(&["s::1", "s::3", "s::0", "missing", "s::2"]));

        let out = rerank_by_overlap("battery", ids(&["s::0", "s::3", "s::1"]), &corpus, 1);
        assert_eq!(out, ids(&["s::3"]));
    }
}
