pub mod field;
pub mod job;
pub mod loaders;
pub mod locator;
pub mod provider;

pub use field::{FieldKind, FieldSnapshot, FieldState};
pub use job::{
    ApplicationOutcome, AttemptResult, FailureReason, JobListing, Provider, RunSummary,
    SkipReason,
};
pub use loaders::{apply_strategy_overrides, load_strategy_file};
pub use locator::{ElementRef, Locator, LocatorSet};
pub use provider::ProviderStrategy;
