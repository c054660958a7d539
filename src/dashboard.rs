//! Static financial dashboard data.
//!
//! The dashboard page renders a fixed P&L snapshot: KPI cards, a margin
//! bridge, and a current-vs-previous detail table. Only the typed data
//! lives here; layout and styling belong to whatever renders it.

use serde::{Deserialize, Serialize};

/// Direction of a KPI delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Visual weight of a margin-bridge bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

/// One KPI card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiMetric {
    pub label: String,
    pub value: String,
    pub delta: String,
    pub trend: Trend,
}

/// One row of the P&L detail table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlRow {
    pub label: String,
    pub current: String,
    pub previous: String,
    pub variance: String,
}

/// One bar of the margin bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRow {
    pub label: String,
    pub value: String,
    /// Bar width as a share of the widest row, 0–100.
    pub width_pct: u8,
    pub tone: Tone,
}

/// The full dashboard dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub kpis: Vec<KpiMetric>,
    pub pnl_rows: Vec<PnlRow>,
    pub bridge_rows: Vec<BridgeRow>,
}

impl DashboardData {
    /// The FY26 Q1 sample snapshot shown in the preview.
    pub fn sample() -> Self {
        fn kpi(label: &str, value: &str, delta: &str, trend: Trend) -> KpiMetric {
            KpiMetric {
                label: label.into(),
                value: value.into(),
                delta: delta.into(),
                trend,
            }
        }
        fn pnl(label: &str, current: &str, previous: &str, variance: &str) -> PnlRow {
            PnlRow {
                label: label.into(),
                current: current.into(),
                previous: previous.into(),
                variance: variance.into(),
            }
        }
        fn bridge(label: &str, value: &str, width_pct: u8, tone: Tone) -> BridgeRow {
            BridgeRow {
                label: label.into(),
                value: value.into(),
                width_pct,
                tone,
            }
        }

        Self {
            kpis: vec![
                kpi("Revenue", "$4.2M", "+8.4% MoM", Trend::Up),
                kpi("COGS", "$1.6M", "-2.1% MoM", Trend::Down),
                kpi("Gross Margin", "62.4%", "+1.8 pts", Trend::Up),
                kpi("Operating Expense", "$1.2M", "+3.2% MoM", Trend::Up),
                kpi("EBITDA", "$980K", "+5.6% MoM", Trend::Up),
                kpi("Net Income", "$620K", "+4.0% MoM", Trend::Up),
            ],
            pnl_rows: vec![
                pnl("Revenue", "$4.2M", "$3.9M", "+$0.3M"),
                pnl("Cost of Goods Sold", "$1.6M", "$1.7M", "-$0.1M"),
                pnl("Gross Profit", "$2.6M", "$2.2M", "+$0.4M"),
                pnl("Operating Expense", "$1.2M", "$1.1M", "+$0.1M"),
                pnl("EBITDA", "$980K", "$920K", "+$60K"),
                pnl("Net Income", "$620K", "$596K", "+$24K"),
            ],
            bridge_rows: vec![
                bridge("Revenue", "$4.2M", 100, Tone::Positive),
                bridge("COGS", "-$1.6M", 58, Tone::Negative),
                bridge("Opex", "-$1.2M", 43, Tone::Negative),
                bridge("One-time Items", "+$0.1M", 12, Tone::Positive),
                bridge("Net Income", "$620K", 34, Tone::Neutral),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_has_six_kpis_and_matching_detail_rows() {
        let data = DashboardData::sample();
        assert_eq!(data.kpis.len(), 6);
        assert_eq!(data.pnl_rows.len(), 6);
        assert_eq!(data.bridge_rows.len(), 5);
    }

    #[test]
    fn revenue_leads_both_views() {
        let data = DashboardData::sample();
        assert_eq!(data.kpis[0].label, "Revenue");
        assert_eq!(data.kpis[0].value, "$4.2M");
        assert_eq!(data.kpis[0].trend, Trend::Up);
        assert_eq!(data.pnl_rows[0].variance, "+$0.3M");
        assert_eq!(data.bridge_rows[0].width_pct, 100);
    }

    #[test]
    fn serializes_with_lowercase_enums() {
        let data = DashboardData::sample();
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"trend\":\"up\""));
        assert!(json.contains("\"tone\":\"negative\""));
    }
}
