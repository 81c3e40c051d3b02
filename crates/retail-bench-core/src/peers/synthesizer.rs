use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::patterns::{IndustryPattern, PatternProfile};
use super::source::TenantCharacteristics;
use crate::types::{round_dp, with_metadata, ComputationOutput, MetricMap, MetricType, SizeTier};
use crate::BenchmarkResult;

/// Peers generated per tier. Fixed so rankings stay comparable across requests.
pub const COHORT_SHAPE: [(SizeTier, usize); 3] =
    [(SizeTier::Small, 25), (SizeTier::Medium, 15), (SizeTier::Large, 10)];

/// Revenue multiples of the tenant's own revenue used when nothing is known
/// about the tenant.
pub const FALLBACK_REVENUE_LADDER: [Decimal; 7] = [
    dec!(0.3),
    dec!(0.5),
    dec!(0.8),
    dec!(1.2),
    dec!(1.5),
    dec!(2.0),
    dec!(2.8),
];

const MARGIN_FLOOR: f64 = 10.0;
const MARGIN_CEILING: f64 = 70.0;
const DEFAULT_SKEWNESS: f64 = 1.0;

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One synthetic competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub peer_id: String,
    pub metrics: MetricMap,
    pub size_tier: SizeTier,
    pub industry_category: IndustryPattern,
}

impl PeerRecord {
    pub fn metric(&self, metric: MetricType) -> Decimal {
        self.metrics.get(&metric).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Summary of a generated cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStatistics {
    pub peer_count: usize,
    pub mean_margin: Decimal,
    pub margin_std_dev: Decimal,
    pub mean_growth: Decimal,
    pub median_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerCohort {
    pub peers: Vec<PeerRecord>,
    pub pattern: IndustryPattern,
    pub tenant_tier: SizeTier,
    /// True when generated from the revenue ladder without characteristics
    pub synthetic_fallback: bool,
    pub statistics: CohortStatistics,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Wall clock XOR a process-wide counter, so two synthesizers started in the
/// same nanosecond still diverge.
fn fresh_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let count = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    nanos ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Normal draw via the Box–Muller transform.
fn box_muller(rng: &mut SmallRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

/// Draw within `range`, pulled toward its midpoint. `skewness = 0` is
/// uniform; larger values cluster harder.
fn skewed_variation(rng: &mut SmallRng, range: (f64, f64), skewness: f64) -> f64 {
    let (lo, hi) = range;
    let centred: f64 = rng.gen_range(-1.0..=1.0);
    let shaped = centred.signum() * centred.abs().powf(1.0 + skewness);
    (lo + hi) / 2.0 + (hi - lo) / 2.0 * shaped
}

fn uniform_decimal(rng: &mut SmallRng, band: (Decimal, Decimal)) -> Decimal {
    let lo = band.0.to_f64().unwrap_or(0.0);
    let hi = band.1.to_f64().unwrap_or(lo);
    if hi <= lo {
        return band.0;
    }
    to_decimal(rng.gen_range(lo..hi), 2).clamp(band.0, band.1)
}

fn to_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| round_dp(d, dp))
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Procedural generator of plausible peer cohorts.
///
/// Unseeded synthesizers draw a fresh seed per call. A fixed seed makes
/// every call reproduce the same cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerSynthesizer {
    seed: Option<u64>,
    skewness: f64,
}

impl Default for PeerSynthesizer {
    fn default() -> Self {
        Self {
            seed: None,
            skewness: DEFAULT_SKEWNESS,
        }
    }
}

impl PeerSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_skewness(mut self, skewness: f64) -> Self {
        self.skewness = if skewness.is_finite() { skewness.max(0.0) } else { DEFAULT_SKEWNESS };
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng(&self) -> SmallRng {
        SmallRng::seed_from_u64(self.seed.unwrap_or_else(fresh_seed))
    }

    /// Never returns an empty cohort. Without characteristics the cohort is
    /// built from the revenue ladder around the tenant's own revenue.
    pub fn synthesize(
        &self,
        characteristics: Option<&TenantCharacteristics>,
        current: &MetricMap,
    ) -> PeerCohort {
        match characteristics {
            Some(c) => self.synthesize_pattern(c, current),
            None => self.synthesize_fallback(current),
        }
    }

    fn synthesize_pattern(&self, c: &TenantCharacteristics, current: &MetricMap) -> PeerCohort {
        let pattern = IndustryPattern::classify(c.primary_category.as_deref());
        let profile = pattern.profile();
        let tenant_tier = c
            .size_tier
            .unwrap_or_else(|| infer_tier(&profile, revenue_of(current), c.location_count));

        let mut rng = self.rng();
        let mut peers = Vec::with_capacity(COHORT_SHAPE.iter().map(|(_, n)| n).sum());
        for (tier, count) in COHORT_SHAPE {
            for _ in 0..count {
                let revenue = uniform_decimal(&mut rng, profile.tier_band(tier));
                let peer_id = format!("peer-{:03}", peers.len() + 1);
                peers.push(self.peer(&mut rng, peer_id, pattern, &profile, tier, revenue));
            }
        }
        debug!(pattern = %pattern, tier = %tenant_tier, peers = peers.len(), "synthesized peer cohort");

        let statistics = cohort_statistics(&peers);
        PeerCohort {
            peers,
            pattern,
            tenant_tier,
            synthetic_fallback: false,
            statistics,
        }
    }

    fn synthesize_fallback(&self, current: &MetricMap) -> PeerCohort {
        let pattern = IndustryPattern::General;
        let profile = pattern.profile();
        let tenant_revenue = revenue_of(current);
        let base = if tenant_revenue > Decimal::ZERO {
            tenant_revenue
        } else {
            (profile.revenue_band.0 + profile.revenue_band.1) / dec!(2)
        };

        let mut rng = self.rng();
        let peers: Vec<PeerRecord> = FALLBACK_REVENUE_LADDER
            .iter()
            .enumerate()
            .map(|(i, multiple)| {
                let revenue = round_dp(base * multiple, 2);
                let tier = profile.tier_for_revenue(revenue);
                let peer_id = format!("fallback-peer-{:02}", i + 1);
                self.peer(&mut rng, peer_id, pattern, &profile, tier, revenue)
            })
            .collect();
        debug!(base = %base, peers = peers.len(), "synthesized fallback peer ladder");

        let statistics = cohort_statistics(&peers);
        PeerCohort {
            peers,
            pattern,
            tenant_tier: profile.tier_for_revenue(base),
            synthetic_fallback: true,
            statistics,
        }
    }

    fn peer(
        &self,
        rng: &mut SmallRng,
        peer_id: String,
        pattern: IndustryPattern,
        profile: &PatternProfile,
        tier: SizeTier,
        revenue: Decimal,
    ) -> PeerRecord {
        let margin = box_muller(rng, profile.margin_mean, profile.margin_std_dev)
            .clamp(MARGIN_FLOOR, MARGIN_CEILING);
        let margin = to_decimal(margin, 2);
        let turnover = to_decimal(skewed_variation(rng, profile.turnover_range, self.skewness), 2);
        let growth = to_decimal(skewed_variation(rng, profile.growth_range, self.skewness), 2);
        let profit = round_dp(revenue * margin / Decimal::ONE_HUNDRED, 2);
        let volume = (revenue / profile.average_unit_price).round();

        let metrics = MetricMap::from([
            (MetricType::Revenue, revenue),
            (MetricType::Profit, profit),
            (MetricType::Margin, margin),
            (MetricType::Turnover, turnover),
            (MetricType::Volume, volume),
            (MetricType::Growth, growth),
        ]);
        PeerRecord {
            peer_id,
            metrics,
            size_tier: tier,
            industry_category: pattern,
        }
    }
}

fn revenue_of(current: &MetricMap) -> Decimal {
    current.get(&MetricType::Revenue).copied().unwrap_or(Decimal::ZERO)
}

/// Tier from revenue when known, otherwise from the store count.
fn infer_tier(profile: &PatternProfile, revenue: Decimal, location_count: u32) -> SizeTier {
    if revenue > Decimal::ZERO {
        return profile.tier_for_revenue(revenue);
    }
    match location_count {
        0..=2 => SizeTier::Small,
        3..=9 => SizeTier::Medium,
        _ => SizeTier::Large,
    }
}

fn cohort_statistics(peers: &[PeerRecord]) -> CohortStatistics {
    let column = |metric: MetricType| -> Vec<f64> {
        peers
            .iter()
            .map(|p| p.metric(metric).to_f64().unwrap_or(0.0))
            .collect()
    };
    let margins = column(MetricType::Margin);
    let growth = column(MetricType::Growth);
    let revenues = Data::new(column(MetricType::Revenue));

    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    CohortStatistics {
        peer_count: peers.len(),
        mean_margin: to_decimal(finite(margins.iter().mean()), 2),
        margin_std_dev: to_decimal(finite(margins.iter().std_dev()), 2),
        mean_growth: to_decimal(finite(growth.iter().mean()), 2),
        median_revenue: to_decimal(finite(revenues.median()), 2),
    }
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

fn default_skewness() -> f64 {
    DEFAULT_SKEWNESS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<TenantCharacteristics>,
    pub current_metrics: MetricMap,
    /// Optional seed for reproducibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default = "default_skewness")]
    pub skewness: f64,
}

pub fn synthesize_peer_cohort(input: &PeerInput) -> BenchmarkResult<ComputationOutput<PeerCohort>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut synthesizer = PeerSynthesizer::new().with_skewness(input.skewness);
    if let Some(seed) = input.seed {
        synthesizer = synthesizer.with_seed(seed);
    }
    let cohort = synthesizer.synthesize(input.characteristics.as_ref(), &input.current_metrics);

    if cohort.synthetic_fallback {
        warnings.push(
            "Tenant characteristics unavailable; peers scaled from the tenant's own revenue".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Procedural peer cohort by industry pattern and size tier",
        &serde_json::json!({
            "cohort_shape": { "small": 25, "medium": 15, "large": 10 },
            "tier_multipliers": { "small": 1, "medium": 8, "large": 40 },
            "margin": "Box-Muller normal clamped to [10, 70]",
            "skewness": input.skewness,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        cohort,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::zeroed_metric_map;

    const SEED: u64 = 42;

    fn tenant(category: &str) -> TenantCharacteristics {
        TenantCharacteristics {
            tenant_id: "t-1".into(),
            primary_category: Some(category.into()),
            size_tier: None,
            location_count: 1,
            product_count: 120,
        }
    }

    fn metrics_with_revenue(revenue: Decimal) -> MetricMap {
        let mut m = zeroed_metric_map();
        m.insert(MetricType::Revenue, revenue);
        m
    }

    #[test]
    fn test_cohort_shape() {
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(Some(&tenant("grocery")), &zeroed_metric_map());
        assert_eq!(cohort.peers.len(), 50);
        assert_eq!(cohort.pattern, IndustryPattern::Food);
        assert!(!cohort.synthetic_fallback);
        for (tier, count) in COHORT_SHAPE {
            assert_eq!(cohort.peers.iter().filter(|p| p.size_tier == tier).count(), count);
        }
    }

    #[test]
    fn test_peer_values_respect_pattern_bounds() {
        let profile = IndustryPattern::Fashion.profile();
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(Some(&tenant("apparel")), &zeroed_metric_map());
        for peer in &cohort.peers {
            let (lo, hi) = profile.tier_band(peer.size_tier);
            let revenue = peer.metric(MetricType::Revenue);
            assert!(revenue >= lo && revenue <= hi, "{} outside band", peer.peer_id);

            let margin = peer.metric(MetricType::Margin);
            assert!(margin >= dec!(10) && margin <= dec!(70));

            let turnover = peer.metric(MetricType::Turnover).to_f64().unwrap();
            assert!(turnover >= profile.turnover_range.0 - 0.01);
            assert!(turnover <= profile.turnover_range.1 + 0.01);
            assert_eq!(peer.metrics.len(), 6);
        }
    }

    #[test]
    fn test_margin_clusters_around_pattern_mean() {
        let profile = IndustryPattern::General.profile();
        let mut margins = Vec::new();
        for seed in 0..20 {
            let cohort = PeerSynthesizer::new()
                .with_seed(seed)
                .synthesize(Some(&tenant("variety store")), &zeroed_metric_map());
            margins.extend(
                cohort
                    .peers
                    .iter()
                    .map(|p| p.metric(MetricType::Margin).to_f64().unwrap()),
            );
        }
        // 1000 draws: standard error of the mean is ~0.25
        let mean = margins.iter().mean();
        let sd = margins.iter().std_dev();
        assert!((mean - profile.margin_mean).abs() < 1.5, "mean {mean}");
        assert!((sd - profile.margin_std_dev).abs() < 1.5, "sd {sd}");
    }

    #[test]
    fn test_skewed_variation_favours_midpoint() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let (lo, hi) = (0.0, 100.0);
        let draws: Vec<f64> = (0..2000).map(|_| skewed_variation(&mut rng, (lo, hi), 1.0)).collect();
        let central = draws.iter().filter(|v| (25.0..=75.0).contains(*v)).count();
        // uniform would put half in the middle band; skewness 1.0 puts ~71%
        assert!(central as f64 / 2000.0 > 0.62, "central share {central}");
        assert!(draws.iter().all(|v| (lo..=hi).contains(v)));
        assert!((draws.iter().mean() - 50.0).abs() < 3.0);
    }

    #[test]
    fn test_zero_skewness_is_uniform() {
        let mut rng = SmallRng::seed_from_u64(SEED);
        let draws: Vec<f64> = (0..2000).map(|_| skewed_variation(&mut rng, (0.0, 100.0), 0.0)).collect();
        let central = draws.iter().filter(|v| (25.0..=75.0).contains(*v)).count();
        let share = central as f64 / 2000.0;
        assert!((share - 0.5).abs() < 0.06, "central share {share}");
    }

    #[test]
    fn test_seeded_reproducibility() {
        let synth = PeerSynthesizer::new().with_seed(SEED);
        let a = synth.synthesize(Some(&tenant("electronics")), &zeroed_metric_map());
        let b = synth.synthesize(Some(&tenant("electronics")), &zeroed_metric_map());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unseeded_calls_diverge() {
        let synth = PeerSynthesizer::new();
        let a = synth.synthesize(Some(&tenant("food")), &zeroed_metric_map());
        let b = synth.synthesize(Some(&tenant("food")), &zeroed_metric_map());
        assert_ne!(a.peers, b.peers);
    }

    #[test]
    fn test_fallback_ladder() {
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(None, &metrics_with_revenue(dec!(1000000000)));
        assert!(cohort.synthetic_fallback);
        let revenues: Vec<Decimal> = cohort.peers.iter().map(|p| p.metric(MetricType::Revenue)).collect();
        assert_eq!(
            revenues,
            vec![
                dec!(300000000),
                dec!(500000000),
                dec!(800000000),
                dec!(1200000000),
                dec!(1500000000),
                dec!(2000000000),
                dec!(2800000000),
            ]
        );
    }

    #[test]
    fn test_fallback_without_revenue_is_not_empty() {
        let cohort = PeerSynthesizer::new().synthesize(None, &zeroed_metric_map());
        assert_eq!(cohort.peers.len(), FALLBACK_REVENUE_LADDER.len());
        assert!(cohort
            .peers
            .iter()
            .all(|p| p.metric(MetricType::Revenue) > Decimal::ZERO));
    }

    #[test]
    fn test_declared_tier_wins_over_revenue() {
        let mut c = tenant("food");
        c.size_tier = Some(SizeTier::Large);
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(Some(&c), &metrics_with_revenue(dec!(1000)));
        assert_eq!(cohort.tenant_tier, SizeTier::Large);
    }

    #[test]
    fn test_tier_inferred_from_locations_without_revenue() {
        let mut c = tenant("food");
        c.location_count = 12;
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(Some(&c), &zeroed_metric_map());
        assert_eq!(cohort.tenant_tier, SizeTier::Large);
    }

    #[test]
    fn test_statistics_summarise_cohort() {
        let cohort = PeerSynthesizer::new()
            .with_seed(SEED)
            .synthesize(Some(&tenant("grocery")), &zeroed_metric_map());
        assert_eq!(cohort.statistics.peer_count, 50);
        assert!(cohort.statistics.margin_std_dev > Decimal::ZERO);
        assert!(cohort.statistics.median_revenue > Decimal::ZERO);
    }

    #[test]
    fn test_envelope_warns_on_fallback() {
        let out = synthesize_peer_cohort(&PeerInput {
            characteristics: None,
            current_metrics: metrics_with_revenue(dec!(500000000)),
            seed: Some(SEED),
            skewness: 1.0,
        })
        .unwrap();
        assert!(out.result.synthetic_fallback);
        assert_eq!(out.warnings.len(), 1);
    }
}
