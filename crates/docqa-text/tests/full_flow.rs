use docqa_core::chunker::Chunker;
use docqa_core::types::{Block, IndexedDocument};
use docqa_text::LexicalCorpus;

fn indexed(source: &str, text: &str) -> Vec<IndexedDocument> {
    Chunker::new(40)
        .chunk(&[Block::new("document", text)])
        .into_iter()
        .map(|c| IndexedDocument::from_chunk(source, c))
        .collect()
}

#[test]
fn lexical_full_flow() {
    let mut corpus = LexicalCorpus::new();
    let manual = "Firecraft basics for camping\nStart with dry tinder\nNetworking cables and routers\nComputer maintenance tips";
    corpus.add(indexed("manual.txt", manual)).expect("add");
    corpus.add(indexed("other.txt", "Routers forward packets between networks")).expect("add");
    eprintln!("lexical corpus holds {} chunks", corpus.len());
    assert!(corpus.len() >= 3);

    for q in ["firecraft", "routers", "computer maintenance"] {
        let hits = corpus.search(q, 10).expect("search");
        eprintln!("q='{}' -> {} hits", q, hits.len());
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    let removed = corpus.remove_source("manual.txt").expect("remove");
    assert!(removed >= 3);
    assert_eq!(corpus.sources(), vec!["other.txt"]);
    assert!(corpus.search("firecraft", 10).expect("search").is_empty());
}
