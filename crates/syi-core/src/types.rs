use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Venue category a yield sample was pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    Cefi,
    Defi,
}

/// One raw annualized-yield observation from one source, at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawYieldSample {
    pub symbol: String,
    pub source_id: String,
    pub source_kind: SourceKind,
    pub chain: Option<String>,
    pub pool_id: Option<String>,
    pub apy_total: Decimal,
    pub apy_base: Option<Decimal>,
    pub apy_reward: Option<Decimal>,
    pub borrow_apy: Option<Decimal>,
    pub tvl_usd: Option<Decimal>,
    pub observed_at: DateTime<Utc>,
}

/// A single price observation for a symbol at a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub venue: String,
    pub price_usd: Decimal,
    pub volume_24h_usd: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// One (price, size) level of an order book half, best price first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// A snapshot of one venue's order book for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    pub venue: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub observed_at: DateTime<Utc>,
}

/// A symbol's circulating market cap, used by the market-cap weighting scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCap {
    pub symbol: String,
    pub market_cap_usd: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// A risk-free reference rate (the 3-month Treasury bill rate feeding the regime engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TBillRate {
    pub tenor: String,
    pub rate: Decimal,
    pub observed_at: DateTime<Utc>,
}

/// Per-(symbol, window) peg stability metrics, derived by the peg & liquidity stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PegMetrics {
    pub symbol: String,
    pub window_end: DateTime<Utc>,
    pub vw_price: Decimal,
    pub peg_dev_bps: f64,
    pub vol_5m_bps: f64,
    pub vol_1h_bps: f64,
    pub peg_score: f64,
}

/// Per-(symbol, window) market-depth metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityMetrics {
    pub symbol: String,
    pub window_end: DateTime<Utc>,
    pub depth_10bps_usd: Decimal,
    pub depth_20bps_usd: Decimal,
    pub depth_50bps_usd: Decimal,
    pub avg_spread_bps: f64,
    pub venues_covered: u32,
    pub liq_score: f64,
}

/// The action a sanitizer took on a raw APY value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SanitizationAction {
    Accept,
    Flag,
    Winsorize,
    Cap,
    Reject,
}

/// Outlier test used to classify a sample against its market context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierMethod {
    Mad,
    Iqr,
}

/// The outcome of running the yield sanitizer on one raw APY.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizationResult {
    pub original_apy: Decimal,
    pub sanitized_apy: Decimal,
    pub action: SanitizationAction,
    pub outlier_score: f64,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub method_used: OutlierMethod,
}

/// The five risk dimensions combined into a Risk-Adjusted Yield. Each is clamped to [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskFactors {
    pub peg_score: f64,
    pub liquidity_score: f64,
    pub counterparty_score: f64,
    pub protocol_reputation: f64,
    pub temporal_stability: f64,
}

impl RiskFactors {
    /// Builds a `RiskFactors`, clamping every component into `[0, 1]`.
    pub fn new(
        peg_score: f64,
        liquidity_score: f64,
        counterparty_score: f64,
        protocol_reputation: f64,
        temporal_stability: f64,
    ) -> Self {
        Self {
            peg_score: peg_score.clamp(0.0, 1.0),
            liquidity_score: liquidity_score.clamp(0.0, 1.0),
            counterparty_score: counterparty_score.clamp(0.0, 1.0),
            protocol_reputation: protocol_reputation.clamp(0.0, 1.0),
            temporal_stability: temporal_stability.clamp(0.0, 1.0),
        }
    }

    /// Geometric-mean risk multiplier, square-rooted per §4.4's dampening rationale.
    pub fn risk_multiplier(&self) -> f64 {
        (self.peg_score
            * self.liquidity_score
            * self.counterparty_score
            * self.protocol_reputation
            * self.temporal_stability)
            .max(0.0)
            .sqrt()
    }

    /// Mean of the five factors, used as the factor-confidence input to RAY confidence.
    pub fn mean_confidence(&self) -> f64 {
        (self.peg_score
            + self.liquidity_score
            + self.counterparty_score
            + self.protocol_reputation
            + self.temporal_stability)
            / 5.0
    }
}

/// A Risk-Adjusted Yield computed for one (symbol, source) pair at an instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAYRecord {
    pub symbol: String,
    pub source_id: String,
    pub base_apy: Decimal,
    pub ray: Decimal,
    pub risk_penalty: Decimal,
    pub confidence: f64,
    pub factors: RiskFactors,
    pub observed_at: DateTime<Utc>,
}

/// One (symbol, source) contributing to an `IndexValue` snapshot. Owned exclusively by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constituent {
    pub id: String,
    pub symbol: String,
    pub source_id: String,
    pub chain: Option<String>,
    pub pool_id: Option<String>,
    pub weight: Decimal,
    pub ray: Decimal,
    pub tvl_usd: Option<Decimal>,
    pub capacity_usd: Option<Decimal>,
    pub record: RAYRecord,
}

/// Which published index a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexCode {
    Syi,
    Syc,
    Sycefi,
    Sydefi,
    Syrpi,
}

impl IndexCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexCode::Syi => "SYI",
            IndexCode::Syc => "SYC",
            IndexCode::Sycefi => "SYCEFI",
            IndexCode::Sydefi => "SYDEFI",
            IndexCode::Syrpi => "SYRPI",
        }
    }

    /// Every published index code, in publication order (§1).
    pub fn all() -> [IndexCode; 5] {
        [
            IndexCode::Syi,
            IndexCode::Syc,
            IndexCode::Sycefi,
            IndexCode::Sydefi,
            IndexCode::Syrpi,
        ]
    }
}

impl std::fmt::Display for IndexCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the market environment a snapshot was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    Normal,
    Bear,
    HighVol,
}

/// One published snapshot of an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexValue {
    pub index_code: IndexCode,
    pub observed_at: DateTime<Utc>,
    pub value: Decimal,
    pub mode: IndexMode,
    pub confidence: f64,
    pub constituent_count: usize,
    pub hhi: f64,
    pub notes: Vec<String>,
    pub staleness_flags: Vec<String>,
    pub constituents: Vec<Constituent>,
}

/// Discrete market-environment classification produced by the regime engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeState {
    On,
    Off,
    OffOverride,
    Neu,
}

/// Alert category emitted alongside a regime evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeAlertType {
    EarlyWarning,
    FlipConfirmed,
    OverridePeg,
    Invalidation,
}

/// Severity of a regime alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeAlertLevel {
    Info,
    Warning,
    Critical,
}

/// A single regime alert, at most one of which is emitted per evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeAlert {
    pub alert_type: RegimeAlertType,
    pub level: RegimeAlertLevel,
    pub message: String,
    pub trigger_conditions: Vec<String>,
}

/// Peg-stress inputs to the regime override rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PegStatus {
    pub max_depeg_bps: i64,
    pub agg_depeg_bps: i64,
}

/// One day's regime evaluation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSample {
    pub date: NaiveDate,
    pub syi_excess: f64,
    pub ema_short: f64,
    pub ema_long: f64,
    pub spread: f64,
    pub volatility_30d: f64,
    pub z_score: f64,
    pub slope7: f64,
    pub breadth_pct: f64,
    pub state: RegimeState,
    pub days_in_state: u32,
    pub alert: Option<RegimeAlert>,
    pub methodology_version: String,
    pub params_version: String,
}

/// Per-symbol RAY feeding a single day's regime evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeComponent {
    pub symbol: String,
    pub ray: f64,
}

/// A single day's raw inputs to the regime engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeDayInput {
    pub date: NaiveDate,
    pub syi: f64,
    pub tbill_3m: f64,
    pub components: Vec<RegimeComponent>,
    pub peg_status: Option<PegStatus>,
}
