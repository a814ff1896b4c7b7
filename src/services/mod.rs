// SafeShelf Core Services

pub mod config_store;
pub mod detection;
pub mod sources;
pub mod text_processor;

pub use config_store::*;
pub use text_processor::*;

pub use detection::{
    aggregate,
    curated_catalog,
    default_vocabulary,
    match_curated,
    scan_terms,
    Classifier,
    CuratedCatalog,
    TermVocabulary,
};
pub use sources::{fetch_text, SourceError, SourceFetch, SourceKind, TextSource};
