use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::peers::patterns::IndustryPattern;
use crate::peers::synthesizer::{PeerCohort, PeerRecord};
use crate::types::{round_dp, MetricMap, MetricType, SizeTier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRanking {
    /// 1 + peers with strictly higher revenue
    pub rank: usize,
    pub peer_count: usize,
    pub percentile: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortAnalysis {
    pub tenant_tier: SizeTier,
    pub pattern: IndustryPattern,
    /// Peers in the tenant's own tier
    pub cohort_size: usize,
    pub cohort_rank: usize,
    pub synthetic_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthComparison {
    pub tenant_growth: Decimal,
    pub peer_mean_growth: Decimal,
    /// Tenant growth minus mean peer growth, in percentage points
    pub growth_advantage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub ranking: PeerRanking,
    pub cohort_analysis: CohortAnalysis,
    pub growth_comparison: GrowthComparison,
    pub insights: Vec<String>,
}

fn value(metrics: &MetricMap, metric: MetricType) -> Decimal {
    metrics.get(&metric).copied().unwrap_or(Decimal::ZERO)
}

/// Rank the tenant by revenue inside a peer cohort.
///
/// An empty cohort is replaced by a single peer mirroring the tenant, which
/// ranks the tenant first of one.
pub fn compare_with_peers(current: &MetricMap, cohort: &PeerCohort) -> PeerComparison {
    let peers: Cow<'_, [PeerRecord]> = if cohort.peers.is_empty() {
        Cow::Owned(vec![PeerRecord {
            peer_id: "mirror-peer".into(),
            metrics: current.clone(),
            size_tier: cohort.tenant_tier,
            industry_category: cohort.pattern,
        }])
    } else {
        Cow::Borrowed(cohort.peers.as_slice())
    };

    let revenue = value(current, MetricType::Revenue);
    let peer_count = peers.len();
    let rank = 1 + peers
        .iter()
        .filter(|p| p.metric(MetricType::Revenue) > revenue)
        .count();
    let percentile = (Decimal::ONE
        - Decimal::from((rank - 1) as u64) / Decimal::from(peer_count as u64))
        * Decimal::ONE_HUNDRED;
    let percentile = round_dp(percentile.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED), 2);

    let same_tier: Vec<&PeerRecord> = peers
        .iter()
        .filter(|p| p.size_tier == cohort.tenant_tier)
        .collect();
    let cohort_rank = 1 + same_tier
        .iter()
        .filter(|p| p.metric(MetricType::Revenue) > revenue)
        .count();

    let tenant_growth = value(current, MetricType::Growth);
    let peer_mean_growth = round_dp(
        peers
            .iter()
            .map(|p| p.metric(MetricType::Growth))
            .sum::<Decimal>()
            / Decimal::from(peer_count as u64),
        2,
    );
    let growth_comparison = GrowthComparison {
        tenant_growth,
        peer_mean_growth,
        growth_advantage: round_dp(tenant_growth - peer_mean_growth, 2),
    };

    let ranking = PeerRanking {
        rank,
        peer_count,
        percentile,
    };
    let cohort_analysis = CohortAnalysis {
        tenant_tier: cohort.tenant_tier,
        pattern: cohort.pattern,
        cohort_size: same_tier.len(),
        cohort_rank,
        synthetic_fallback: cohort.synthetic_fallback,
    };
    let insights = insights(current, &peers, &ranking, &cohort_analysis, &growth_comparison);

    PeerComparison {
        ranking,
        cohort_analysis,
        growth_comparison,
        insights,
    }
}

fn insights(
    current: &MetricMap,
    peers: &[PeerRecord],
    ranking: &PeerRanking,
    cohort: &CohortAnalysis,
    growth: &GrowthComparison,
) -> Vec<String> {
    let mut out = Vec::new();

    if ranking.percentile >= Decimal::from(75) {
        out.push(format!(
            "Revenue ranks {} of {} comparable {} retailers, in the top quartile",
            ranking.rank, ranking.peer_count, cohort.pattern
        ));
    } else if ranking.percentile < Decimal::from(25) {
        out.push(format!(
            "Revenue ranks {} of {}; most comparable {} retailers sell more",
            ranking.rank, ranking.peer_count, cohort.pattern
        ));
    } else {
        out.push(format!(
            "Revenue ranks {} of {}, mid-table among comparable {} retailers",
            ranking.rank, ranking.peer_count, cohort.pattern
        ));
    }

    if cohort.cohort_size > 0 {
        out.push(format!(
            "Within the {} tier you rank {} of {}",
            cohort.tenant_tier, cohort.cohort_rank, cohort.cohort_size
        ));
    }

    if growth.growth_advantage > Decimal::ZERO {
        out.push(format!(
            "Growing {} points faster than the peer average",
            growth.growth_advantage
        ));
    } else if growth.growth_advantage < Decimal::ZERO {
        out.push(format!(
            "Growing {} points slower than the peer average",
            growth.growth_advantage.abs()
        ));
    }

    let mean_margin = peers
        .iter()
        .map(|p| p.metric(MetricType::Margin))
        .sum::<Decimal>()
        / Decimal::from(peers.len().max(1) as u64);
    let margin = value(current, MetricType::Margin);
    if margin < mean_margin {
        out.push(format!(
            "Margin of {margin}% is below the peer mean of {}%",
            round_dp(mean_margin, 2)
        ));
    }

    if cohort.synthetic_fallback {
        out.push(
            "Peers were estimated from your own revenue; add business category and size for a sharper comparison"
                .into(),
        );
    }
    out
}
