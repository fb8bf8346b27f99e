pub mod aggregator;
pub mod classifier;
pub mod file_store;
pub mod normalize;
pub mod persister;

pub use aggregator::{merge_outcomes, OutputColumns, RESULT_COLUMN_RENAMES};
pub use classifier::{Classification, Decision, FailurePlaceholder, Marker, OutcomeClassifier};
pub use file_store::FileStore;
pub use normalize::{normalize_phone, Normalization};
pub use persister::write_xlsx;
