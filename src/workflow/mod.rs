pub mod lookup_ctx;
pub mod lookup_flow;

pub use lookup_ctx::RecordCtx;
pub use lookup_flow::{ClassificationMode, FormInput, InteractionScript, LookupFlow};
