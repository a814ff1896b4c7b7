// Detection Module
// Verdict engine organized into specialized submodules:
// - curated_catalog: Known-sensitive titles and the containment matcher
// - term_scanner: Trigger vocabulary and substring scan
// - aggregation: Fixed-precedence verdict decision
// - classifier: Request validation and concurrent source fan-out

pub mod aggregation;
pub mod classifier;
pub mod curated_catalog;
pub mod term_scanner;

pub use aggregation::aggregate;
pub use classifier::Classifier;
pub use curated_catalog::{
    curated_catalog,
    match_curated,
    match_curated_entries,
    CuratedCatalog,
    CuratedEntry,
};
pub use term_scanner::{default_vocabulary, scan_terms, TermVocabulary};
