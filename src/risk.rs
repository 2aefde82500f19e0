//! Risk aggregation over financial statements.
//!
//! Combines the individual indicator calculators into the named indicator
//! map and the single scalar risk score. Pure computation over supplied
//! data; no I/O, safe to call concurrently.

use crate::indicators::{
    balance_sheet_volatility, cash_ratio, check_compliance_status,
    check_for_irregular_fiscal_year, concentration_risk, debt_to_assets_ratio,
    debt_to_equity_ratio, deferred_income_reliance, equity_ratio, growth_revenue,
    operational_result_profit,
};
use crate::models::{
    FinancialStatement, HasRegistrationDate, IndicatorKey, IndicatorValue, RiskIndicatorSet,
};
use chrono::NaiveDate;

/// Splits a company's retrieved statements into the current basis and the
/// historical comparison context.
///
/// The document gateway returns entries in external listing order, which
/// is not guaranteed chronological, so the list is re-sorted ascending by
/// fiscal-year end date before selection (stable: undated statements keep
/// their relative order and sort before dated ones). The returned
/// historical list is ordered oldest reference period first and excludes
/// the latest statement. Returns `None` for an empty input.
pub fn select_statements(
    mut statements: Vec<FinancialStatement>,
) -> Option<(FinancialStatement, Vec<FinancialStatement>)> {
    statements.sort_by_key(|s| s.fiscal_year.end_date);
    let latest = statements.pop()?;
    Some((latest, statements))
}

/// Computes the full indicator map and aggregate risk score for the
/// latest financial statement of a company.
///
/// `historical` must be ordered oldest reference period first and must
/// not contain `latest` (use [`select_statements`]); growth and
/// volatility indicators compare against its first element. An empty or
/// partial historical list degrades those indicators to unknown instead
/// of failing. `as_of_date` is the reference date for the compliance
/// check; passing it in keeps the computation deterministic.
///
/// The returned map always carries all eleven indicator keys. The score
/// is the mean of the non-unknown values with flags counted as 1.0/0.0,
/// or `None` when every indicator is unknown.
pub fn calculate_risk_indicators<T: HasRegistrationDate>(
    latest: &FinancialStatement,
    historical: &[FinancialStatement],
    filing_entries: &[T],
    as_of_date: NaiveDate,
) -> (RiskIndicatorSet, Option<f64>) {
    let equity = latest.liabilities_equity.equity;
    let liabilities = latest.liabilities_equity.liabilities;
    let deferred_income = latest.liabilities_equity.deferred_income;
    let total_assets = latest.assets.total_assets;
    let receivables = latest.assets.receivables_and_other_assets;
    let cash = latest.assets.cash_and_cash_equivalents;

    let total_funding = equity.zip(liabilities).map(|(e, l)| e + l);

    // Reference period for the growth/volatility comparisons.
    let previous = historical.first();
    let previous_assets = previous.and_then(|p| p.assets.total_assets);
    let previous_revenue = previous.and_then(|p| p.income_statement.revenue);
    let previous_profit = previous.and_then(|p| p.income_statement.net_income);

    let irregular_fiscal_year = match (latest.fiscal_year.start_date, latest.fiscal_year.end_date)
    {
        (Some(start), Some(end)) => {
            IndicatorValue::Flag(check_for_irregular_fiscal_year(start, end))
        }
        // The upstream parser normally guarantees both dates; absence is
        // invalid input and degrades this single indicator.
        _ => IndicatorValue::Unknown,
    };

    let mut indicators = RiskIndicatorSet::new();
    indicators.insert(
        IndicatorKey::DebtToEquityRatio,
        equity
            .zip(liabilities)
            .and_then(|(e, l)| debt_to_equity_ratio(e, l))
            .into(),
    );
    indicators.insert(
        IndicatorKey::ConcentrationRisk,
        receivables
            .zip(total_assets)
            .and_then(|(r, t)| concentration_risk(r, t))
            .into(),
    );
    indicators.insert(
        IndicatorKey::BalanceSheetVolatility,
        total_assets
            .zip(previous_assets)
            .and_then(|(c, p)| balance_sheet_volatility(c, p))
            .into(),
    );
    indicators.insert(
        IndicatorKey::CashRatio,
        cash.zip(liabilities)
            .and_then(|(c, l)| cash_ratio(c, l))
            .into(),
    );
    indicators.insert(
        IndicatorKey::DebtToAssetsRatio,
        liabilities
            .zip(total_assets)
            .and_then(|(l, t)| debt_to_assets_ratio(l, t))
            .into(),
    );
    indicators.insert(
        IndicatorKey::EquityRatio,
        equity
            .zip(total_assets)
            .and_then(|(e, t)| equity_ratio(e, t))
            .into(),
    );
    indicators.insert(
        IndicatorKey::GrowthRevenue,
        latest
            .income_statement
            .revenue
            .zip(previous_revenue)
            .and_then(|(c, p)| growth_revenue(c, p))
            .into(),
    );
    indicators.insert(
        IndicatorKey::OperationalResultProfit,
        latest
            .income_statement
            .net_income
            .zip(previous_profit)
            .and_then(|(c, p)| operational_result_profit(c, p))
            .into(),
    );
    indicators.insert(
        IndicatorKey::DeferredIncomeReliance,
        deferred_income
            .zip(total_funding)
            .and_then(|(d, t)| deferred_income_reliance(d, t))
            .into(),
    );
    indicators.insert(IndicatorKey::IrregularFiscalYear, irregular_fiscal_year);
    indicators.insert(
        IndicatorKey::ComplianceStatus,
        check_compliance_status(filing_entries, as_of_date).into(),
    );

    let score = aggregate_score(&indicators);
    (indicators, score)
}

/// Mean of the non-unknown indicator values; `None` on an all-unknown
/// set (a mean over nothing is undefined, not an error).
fn aggregate_score(indicators: &RiskIndicatorSet) -> Option<f64> {
    let values: Vec<f64> = indicators.values().filter_map(|v| v.numeric()).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
