pub mod event;
pub mod lookup;
pub mod table;

pub use event::{Counters, ProgressEvent, RecordEvent};
pub use lookup::{
    FieldRole, LookupFamily, LookupKind, LookupOutcome, LookupRequest, OutcomeKind, OutcomeValue,
};
pub use table::{Record, Table};
