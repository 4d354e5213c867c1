pub mod params;
pub mod policy;
pub mod search;

pub use params::{MaxEntropyParams, MaxProbabilityParams};
pub use policy::{
    DecisionContext, HumanPolicy, MaxEntropyPolicy, MaxProbabilityPolicy, Policy, PolicySpec,
    SelfInformation,
};
pub use search::SearchBudget;
