pub mod errors;
pub mod model;
pub mod mutation;
pub mod scope;
pub mod segment;
pub mod selection;
pub mod state;
pub mod view_delta;

// Re-export key types for easier usage
pub use errors::{EngineError, EngineResult};
pub use model::*;
pub use mutation::{
    BatchMutation, Mutation, MutationOutcome, SelectionRangeTransform, apply_mutation,
    apply_mutation_with_view_delta, make_remove_range_mutation,
};
pub use scope::{ScopeArena, ScopeError, ScopeId};
pub use segment::{Granularity, Segment, Segmenter, SegmenterFactory};
pub use selection::*;
pub use state::{Delta, Phase, State, StateControl, StateControlConfig, StateSnapshot};
pub use view_delta::{ViewControl, ViewDelta, ViewDeltaControl};

pub use folio_config::FixPolicy;
