use std::collections::HashSet;

use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};
use tantivy::Index;

pub const LEXICAL_TOKENIZER: &str = "lexical";

#[derive(Debug, Clone, Copy)]
pub struct LexicalFields {
    pub id: Field,
    pub text: Field,
}

pub fn build_schema() -> (Schema, LexicalFields) {
    let mut schema_builder = Schema::builder();
    let id = schema_builder.add_text_field("id", STRING | STORED);
    let text_field_indexing = TextFieldIndexing::default()
        .set_tokenizer(LEXICAL_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqs);
    let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
    let text = schema_builder.add_text_field("text", text_options);
    (schema_builder.build(), LexicalFields { id, text })
}

/// Case-insensitive alphanumeric runs. No stop words, no stemming.
pub fn lexical_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
}

pub fn register_tokenizer(index: &Index) {
    index.tokenizers().register(LEXICAL_TOKENIZER, lexical_analyzer());
}

/// Tokens in order, duplicates kept. Same analyzer the index uses.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut analyzer = lexical_analyzer();
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}

pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}
