pub mod patterns;
pub mod source;
pub mod synthesizer;

pub use patterns::{tier_multiplier, IndustryPattern, PatternProfile};
pub use source::{CharacteristicsSource, InMemoryCharacteristicsSource, TenantCharacteristics};
pub use synthesizer::{
    synthesize_peer_cohort, CohortStatistics, PeerCohort, PeerInput, PeerRecord, PeerSynthesizer,
    COHORT_SHAPE, FALLBACK_REVENUE_LADDER,
};
