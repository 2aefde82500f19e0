use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============ Database Models ============

/// A company record from the Austrian commercial register ("Firmenbuch").
///
/// This is the central entity served by the search and detail endpoints.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// Registry number ("Firmenbuchnummer"), e.g. "123456a".
    pub firmenbuchnummer: String,
    /// Registered company name.
    pub name: String,
    /// Legal form (e.g. "GmbH", "AG").
    pub legal_form: Option<String>,
    /// Declared business purpose.
    pub business_purpose: Option<String>,
    /// Seat (registered municipality).
    pub seat: Option<String>,
    /// Date the register extract was taken.
    pub reference_date: Option<NaiveDate>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Minimal company representation used in search result lists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CompanyListItem {
    pub firmenbuchnummer: String,
    pub name: String,
    pub legal_form: Option<String>,
    pub business_purpose: Option<String>,
    pub seat: Option<String>,
}

/// Autocomplete suggestion: registry number and name only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CompanySuggestion {
    pub firmenbuchnummer: String,
    pub name: String,
}

/// A registry filing event stored for a company.
///
/// Filing entries drive the compliance check; entries without a
/// `registration_date` are skipped there without invalidating the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryFilingEntry {
    /// Free-text classification, e.g. "Neueintragung" or "Änderung".
    pub entry_type: Option<String>,
    /// Competent registry court.
    pub court: Option<String>,
    /// Court file number.
    pub file_number: Option<String>,
    /// Date the application was filed.
    pub application_date: Option<NaiveDate>,
    /// Date the filing was registered.
    pub registration_date: Option<NaiveDate>,
}

/// Accessor for the registration date of a filing record.
///
/// The compliance check depends only on this trait, so plain
/// `RegistryFilingEntry` values and database rows are both accepted
/// without the check branching on the concrete representation.
pub trait HasRegistrationDate {
    fn registration_date(&self) -> Option<NaiveDate>;
}

impl HasRegistrationDate for RegistryFilingEntry {
    fn registration_date(&self) -> Option<NaiveDate> {
        self.registration_date
    }
}

// ============ Financial Statements ============

/// Asset side of a parsed balance sheet. Every position is optional:
/// the upstream document parser only fills what it finds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPositions {
    pub total_assets: Option<f64>,
    pub fixed_assets: Option<f64>,
    pub intangible_assets: Option<f64>,
    pub tangible_assets: Option<f64>,
    pub financial_assets: Option<f64>,
    pub current_assets: Option<f64>,
    pub inventories: Option<f64>,
    pub receivables_and_other_assets: Option<f64>,
    pub securities: Option<f64>,
    pub cash_and_cash_equivalents: Option<f64>,
    pub prepaid_expenses: Option<f64>,
    pub active_deferred_taxes: Option<f64>,
}

/// Liabilities-and-equity side of a parsed balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiabilitiesEquity {
    pub equity: Option<f64>,
    pub subscribed_capital: Option<f64>,
    pub capital_reserves: Option<f64>,
    pub revenue_reserves: Option<f64>,
    pub net_profit_loss: Option<f64>,
    pub liabilities: Option<f64>,
    pub deferred_income: Option<f64>,
    pub passive_deferred_taxes: Option<f64>,
    pub total_liabilities_and_equity: Option<f64>,
}

/// Income statement figures, present only in documents that include one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeStatement {
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
}

/// Fiscal year covered by a financial statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalYear {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One parsed balance-sheet/income-statement snapshot retrieved from the
/// registry document gateway.
///
/// Immutable once produced. All monetary amounts are units of the single
/// statement currency; absent and null positions are equivalent and the
/// risk engine treats both as "not reported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialStatement {
    pub assets: AssetPositions,
    pub liabilities_equity: LiabilitiesEquity,
    pub income_statement: IncomeStatement,
    pub fiscal_year: FiscalYear,
    pub currency: Option<String>,
    pub notes: Option<serde_json::Value>,
}

// ============ Risk Indicators ============

/// Fixed, versioned vocabulary of risk indicators.
///
/// Downstream renderers key off the serialized names; renaming a variant
/// is a breaking change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKey {
    DebtToEquityRatio,
    ConcentrationRisk,
    BalanceSheetVolatility,
    CashRatio,
    DebtToAssetsRatio,
    EquityRatio,
    GrowthRevenue,
    OperationalResultProfit,
    DeferredIncomeReliance,
    IrregularFiscalYear,
    ComplianceStatus,
}

impl IndicatorKey {
    /// All indicator keys, in map order.
    pub const ALL: [IndicatorKey; 11] = [
        IndicatorKey::DebtToEquityRatio,
        IndicatorKey::ConcentrationRisk,
        IndicatorKey::BalanceSheetVolatility,
        IndicatorKey::CashRatio,
        IndicatorKey::DebtToAssetsRatio,
        IndicatorKey::EquityRatio,
        IndicatorKey::GrowthRevenue,
        IndicatorKey::OperationalResultProfit,
        IndicatorKey::DeferredIncomeReliance,
        IndicatorKey::IrregularFiscalYear,
        IndicatorKey::ComplianceStatus,
    ];

    /// The serialized wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKey::DebtToEquityRatio => "debt_to_equity_ratio",
            IndicatorKey::ConcentrationRisk => "concentration_risk",
            IndicatorKey::BalanceSheetVolatility => "balance_sheet_volatility",
            IndicatorKey::CashRatio => "cash_ratio",
            IndicatorKey::DebtToAssetsRatio => "debt_to_assets_ratio",
            IndicatorKey::EquityRatio => "equity_ratio",
            IndicatorKey::GrowthRevenue => "growth_revenue",
            IndicatorKey::OperationalResultProfit => "operational_result_profit",
            IndicatorKey::DeferredIncomeReliance => "deferred_income_reliance",
            IndicatorKey::IrregularFiscalYear => "irregular_fiscal_year",
            IndicatorKey::ComplianceStatus => "compliance_status",
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single risk indicator.
///
/// Magnitude-style indicators carry a score in [0,1], flag-style
/// indicators a boolean. `Unknown` means the inputs were insufficient;
/// it serializes as JSON null so consumers can tell "computed low risk"
/// from "could not be computed".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Score(f64),
    Flag(bool),
    Unknown,
}

impl IndicatorValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, IndicatorValue::Unknown)
    }

    /// Numeric contribution to the aggregate risk score.
    ///
    /// Flags map to 1.0/0.0; `Unknown` contributes nothing.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            IndicatorValue::Score(v) => Some(*v),
            IndicatorValue::Flag(true) => Some(1.0),
            IndicatorValue::Flag(false) => Some(0.0),
            IndicatorValue::Unknown => None,
        }
    }
}

impl From<Option<f64>> for IndicatorValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => IndicatorValue::Score(v),
            None => IndicatorValue::Unknown,
        }
    }
}

impl From<Option<bool>> for IndicatorValue {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(v) => IndicatorValue::Flag(v),
            None => IndicatorValue::Unknown,
        }
    }
}

/// Named indicator map produced by the risk aggregator.
///
/// Always contains every key in [`IndicatorKey::ALL`].
pub type RiskIndicatorSet = BTreeMap<IndicatorKey, IndicatorValue>;

/// Computed risk data for one (company, latest statement) pair.
///
/// `score` is the arithmetic mean of the non-unknown indicator values;
/// `None` when every indicator is unknown. This is the value cached by
/// the indicator cache and returned to API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub indicators: RiskIndicatorSet,
    pub score: Option<f64>,
}

/// A company together with its (optionally computed) risk data.
///
/// Built by the handler layer; risk data is never stashed on a
/// persistence row.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyWithRisk {
    #[serde(flatten)]
    pub company: Company,
    pub risk: Option<RiskAssessment>,
}

// ============ API Payloads ============

/// Query parameters accepted by the search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    pub query: String,
}

/// Response body of the company search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<CompanyListItem>,
}

/// Response body of the risk endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResponse {
    pub firmenbuchnummer: String,
    pub risk_score: Option<f64>,
    pub risk_indicators: RiskIndicatorSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_value_serializes_to_number_bool_or_null() {
        assert_eq!(
            serde_json::to_value(IndicatorValue::Score(0.4)).unwrap(),
            serde_json::json!(0.4)
        );
        assert_eq!(
            serde_json::to_value(IndicatorValue::Flag(true)).unwrap(),
            serde_json::json!(true)
        );
        assert_eq!(
            serde_json::to_value(IndicatorValue::Unknown).unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn indicator_value_roundtrips_from_json() {
        let v: IndicatorValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(v, IndicatorValue::Score(0.25));
        let v: IndicatorValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, IndicatorValue::Flag(false));
        let v: IndicatorValue = serde_json::from_str("null").unwrap();
        assert!(v.is_unknown());
    }

    #[test]
    fn indicator_keys_keep_their_wire_names() {
        // The vocabulary is versioned; renaming a key breaks consumers.
        for key in IndicatorKey::ALL {
            assert_eq!(
                serde_json::to_value(key).unwrap(),
                serde_json::json!(key.as_str())
            );
        }
        assert_eq!(
            IndicatorKey::DebtToEquityRatio.as_str(),
            "debt_to_equity_ratio"
        );
        assert_eq!(IndicatorKey::ComplianceStatus.as_str(), "compliance_status");
    }

    #[test]
    fn statement_parses_with_missing_positions() {
        // Absent and null categories are both "not reported".
        let json = r#"{
            "assets": {"total_assets": 1000000.0, "cash_and_cash_equivalents": null},
            "liabilities_equity": {"equity": 400000.0},
            "fiscal_year": {"start_date": "2023-01-01", "end_date": "2023-12-31"}
        }"#;
        let statement: FinancialStatement = serde_json::from_str(json).unwrap();
        assert_eq!(statement.assets.total_assets, Some(1_000_000.0));
        assert_eq!(statement.assets.cash_and_cash_equivalents, None);
        assert_eq!(statement.assets.inventories, None);
        assert_eq!(statement.liabilities_equity.equity, Some(400_000.0));
        assert_eq!(statement.income_statement.revenue, None);
    }
}
