//! Discounted CFR blueprint training and policy evaluation.

mod dcfr;
mod evaluator;
mod nodes;
mod profiles;
mod trainer;

pub use dcfr::DcfrSchedule;
pub use evaluator::{evaluate_profiles, Evaluator};
pub use nodes::{regret_match, NodeStats, NodeTable};
pub use profiles::Profile;
pub use trainer::{policy_drift, BlueprintTrainer, TrainerConfig};
