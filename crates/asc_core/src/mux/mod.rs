//! Remediation planning for the muxer.

mod delay_calculator;

pub use delay_calculator::{
    match_standard, resolve, tempo_ratio, PlanAction, SyncPlan, CUSTOM_STANDARD,
    STANDARD_MATCH_EPSILON, STANDARD_RATIOS,
};
