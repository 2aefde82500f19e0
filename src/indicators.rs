//! Financial risk indicator calculators.
//!
//! Every calculator is a pure function over monetary amounts of one
//! statement currency. Magnitude-style indicators return a risk score in
//! [0,1] (0 = low risk, 1 = high risk); flag-style indicators return a
//! boolean. `None` means the indicator could not be computed from the
//! given inputs; callers must surface that as "unknown", never as zero.

use crate::models::HasRegistrationDate;
use chrono::{Datelike, NaiveDate};

/// Days within which the most recent registry filing must have been
/// registered for a company to count as compliant (~18 months).
pub const COMPLIANCE_WINDOW_DAYS: i64 = 548;

/// A percentage change of this size (in percent) saturates the
/// balance-sheet volatility score at 1.0.
const VOLATILITY_SATURATION_PCT: f64 = 50.0;

/// A relative decline of this size saturates the growth-style scores.
const DECLINE_SATURATION: f64 = 0.5;

/// Share of total funding above which deferred income reliance flags.
const DEFERRED_INCOME_THRESHOLD: f64 = 0.5;

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// How much of the company is funded by borrowed money vs. owners' money.
///
/// Risk score `1 / (1 + equity/liabilities)`: plentiful equity relative to
/// debt pushes the score towards 0. Non-positive liabilities are treated
/// as malformed input, not as a risk scenario.
pub fn debt_to_equity_ratio(equity: f64, liabilities: f64) -> Option<f64> {
    if liabilities <= 0.0 {
        return None;
    }
    Some(clamp_unit(1.0 / (1.0 + equity / liabilities)))
}

/// Share of total assets that are receivables from affiliated companies.
pub fn concentration_risk(receivables: f64, total_assets: f64) -> Option<f64> {
    if total_assets <= 0.0 {
        return None;
    }
    Some(clamp_unit(receivables / total_assets))
}

/// Year-over-year swing of a balance-sheet position.
///
/// `min(1, |pct_change| / 50)` where pct_change is the percentage change
/// from `previous` to `current`. A zero previous value with a nonzero
/// current one has no defined percentage change and yields `None`; zero
/// to zero is no change at all and scores 0.0.
pub fn balance_sheet_volatility(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return if current == 0.0 { Some(0.0) } else { None };
    }
    let pct_change = (current - previous) / previous * 100.0;
    Some((pct_change.abs() / VOLATILITY_SATURATION_PCT).min(1.0))
}

/// How well short-term debt is covered by cash on hand.
///
/// Risk score `1 / (1 + cash/liabilities)`: low cash coverage scores high.
pub fn cash_ratio(cash: f64, liabilities: f64) -> Option<f64> {
    if liabilities == 0.0 {
        return None;
    }
    Some(clamp_unit(1.0 / (1.0 + cash / liabilities)))
}

/// Share of total assets financed by debt.
pub fn debt_to_assets_ratio(liabilities: f64, total_assets: f64) -> Option<f64> {
    if total_assets <= 0.0 {
        return None;
    }
    Some(clamp_unit(liabilities / total_assets))
}

/// Complement of the equity share of total assets.
pub fn equity_ratio(equity: f64, total_assets: f64) -> Option<f64> {
    if total_assets <= 0.0 {
        return None;
    }
    Some(clamp_unit(1.0 - equity / total_assets))
}

/// Shared decline scoring for the growth-style indicators: growth or
/// stagnation scores 0.0, a decline scores `min(1, |growth| / 0.5)`.
/// Same zero rules as [`balance_sheet_volatility`].
fn decline_risk(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return if current == 0.0 { Some(0.0) } else { None };
    }
    let growth = (current - previous) / previous;
    if growth >= 0.0 {
        Some(0.0)
    } else {
        Some((growth.abs() / DECLINE_SATURATION).min(1.0))
    }
}

/// Revenue decline between the reference period and the latest statement.
pub fn growth_revenue(current_revenue: f64, previous_revenue: f64) -> Option<f64> {
    decline_risk(current_revenue, previous_revenue)
}

/// Net-income decline between the reference period and the latest statement.
pub fn operational_result_profit(current_profit: f64, previous_profit: f64) -> Option<f64> {
    decline_risk(current_profit, previous_profit)
}

/// Flags companies funding themselves mostly from customers paying
/// upfront: deferred income at or above half of total funding
/// (equity + liabilities).
pub fn deferred_income_reliance(deferred_income: f64, total_funding: f64) -> Option<bool> {
    if total_funding <= 0.0 {
        return None;
    }
    Some(deferred_income / total_funding >= DEFERRED_INCOME_THRESHOLD)
}

/// Whether the fiscal year covers fewer whole months than a regular one.
///
/// The span is whole-month arithmetic, not calendar-day arithmetic:
/// Jan 1 – Dec 31 spans 11 whole months and is regular; anything shorter
/// is irregular. Date presence is enforced by the signature; the
/// aggregator maps missing dates to an unknown indicator.
pub fn check_for_irregular_fiscal_year(start_date: NaiveDate, end_date: NaiveDate) -> bool {
    let months = (end_date.year() - start_date.year()) * 12
        + (end_date.month() as i32 - start_date.month() as i32);
    months < 11
}

/// Whether the company has a sufficiently recent registry filing.
///
/// No filing history at all is treated as non-compliant, not unknown.
/// If entries exist but none carries a registration date, the status
/// cannot be determined and `None` is returned. Otherwise the company is
/// compliant iff its most recent registration date is within
/// [`COMPLIANCE_WINDOW_DAYS`] of `as_of_date`.
pub fn check_compliance_status<T: HasRegistrationDate>(
    entries: &[T],
    as_of_date: NaiveDate,
) -> Option<bool> {
    if entries.is_empty() {
        return Some(false);
    }
    let most_recent = entries.iter().filter_map(|e| e.registration_date()).max()?;
    Some((as_of_date - most_recent).num_days() <= COMPLIANCE_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistryFilingEntry;

    fn filing(registration_date: Option<NaiveDate>, entry_type: &str) -> RegistryFilingEntry {
        RegistryFilingEntry {
            entry_type: Some(entry_type.to_string()),
            registration_date,
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_debt_to_equity_happy_path() {
        // equity=50M, liabilities=100M -> ratio=0.5 -> 1/(1+0.5)=0.666...
        let result = debt_to_equity_ratio(50_000_000.0, 100_000_000.0).unwrap();
        assert!((result - 0.6666666666666666).abs() < 0.0001);
    }

    #[test]
    fn test_debt_to_equity_very_high_risk() {
        // equity=50M, liabilities=200M -> ratio=0.25 -> 1/(1+0.25)=0.8
        let result = debt_to_equity_ratio(50_000_000.0, 200_000_000.0).unwrap();
        assert!((result - 0.8).abs() < 0.0001);
    }

    #[test]
    fn test_debt_to_equity_low_risk() {
        // equity=200M, liabilities=50M -> ratio=4.0 -> 1/(1+4.0)=0.2
        let result = debt_to_equity_ratio(200_000_000.0, 50_000_000.0).unwrap();
        assert!((result - 0.2).abs() < 0.0001);
    }

    #[test]
    fn test_debt_to_equity_invalid_liabilities() {
        assert_eq!(debt_to_equity_ratio(100_000_000.0, 0.0), None);
        assert_eq!(debt_to_equity_ratio(100_000_000.0, -50_000_000.0), None);
    }

    #[test]
    fn test_concentration_risk_happy_path() {
        assert_eq!(
            concentration_risk(10_000_000.0, 100_000_000.0),
            Some(0.1)
        );
        assert_eq!(
            concentration_risk(50_000_000.0, 100_000_000.0),
            Some(0.5)
        );
    }

    #[test]
    fn test_concentration_risk_clamped_and_guarded() {
        assert_eq!(concentration_risk(150.0, 100.0), Some(1.0));
        assert_eq!(concentration_risk(10_000_000.0, 0.0), None);
        assert_eq!(concentration_risk(10_000_000.0, -1.0), None);
    }

    #[test]
    fn test_volatility_growth_and_shrink_are_symmetric() {
        // +-20% change -> min(1, 20/50) = 0.4
        assert_eq!(balance_sheet_volatility(120.0, 100.0), Some(0.4));
        assert_eq!(balance_sheet_volatility(80.0, 100.0), Some(0.4));
    }

    #[test]
    fn test_volatility_saturates_at_one() {
        assert_eq!(balance_sheet_volatility(150.0, 100.0), Some(1.0));
        assert_eq!(balance_sheet_volatility(400.0, 100.0), Some(1.0));
    }

    #[test]
    fn test_volatility_zero_rules() {
        assert_eq!(balance_sheet_volatility(100.0, 100.0), Some(0.0));
        assert_eq!(balance_sheet_volatility(0.0, 0.0), Some(0.0));
        assert_eq!(balance_sheet_volatility(100.0, 0.0), None);
    }

    #[test]
    fn test_cash_ratio_low_coverage_scores_high() {
        // cash=10M, liabilities=100M -> 1/(1+0.1)=0.909...
        let result = cash_ratio(10_000_000.0, 100_000_000.0).unwrap();
        assert!((result - 0.9090909090909091).abs() < 0.0001);
    }

    #[test]
    fn test_cash_ratio_zero_liabilities_unknown() {
        assert_eq!(cash_ratio(10_000_000.0, 0.0), None);
    }

    #[test]
    fn test_debt_to_assets_ratio() {
        assert_eq!(debt_to_assets_ratio(60.0, 100.0), Some(0.6));
        assert_eq!(debt_to_assets_ratio(150.0, 100.0), Some(1.0));
        assert_eq!(debt_to_assets_ratio(60.0, 0.0), None);
        assert_eq!(debt_to_assets_ratio(60.0, -10.0), None);
    }

    #[test]
    fn test_equity_ratio() {
        assert_eq!(equity_ratio(40.0, 100.0), Some(0.6));
        assert_eq!(equity_ratio(0.0, 100.0), Some(1.0));
        // More equity than assets clamps to 0 rather than going negative.
        assert_eq!(equity_ratio(150.0, 100.0), Some(0.0));
        assert_eq!(equity_ratio(40.0, 0.0), None);
    }

    #[test]
    fn test_growth_revenue_decline_scores() {
        // 80 vs 100 -> -20% -> min(1, 0.2/0.5) = 0.4
        assert_eq!(growth_revenue(80.0, 100.0), Some(0.4));
        // -50% or worse saturates.
        assert_eq!(growth_revenue(50.0, 100.0), Some(1.0));
        assert_eq!(growth_revenue(10.0, 100.0), Some(1.0));
    }

    #[test]
    fn test_growth_revenue_growth_is_no_risk() {
        assert_eq!(growth_revenue(120.0, 100.0), Some(0.0));
        assert_eq!(growth_revenue(100.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_growth_revenue_zero_rules() {
        assert_eq!(growth_revenue(0.0, 0.0), Some(0.0));
        assert_eq!(growth_revenue(100.0, 0.0), None);
    }

    #[test]
    fn test_operational_result_profit_mirrors_growth_rules() {
        assert_eq!(operational_result_profit(80.0, 100.0), Some(0.4));
        assert_eq!(operational_result_profit(120.0, 100.0), Some(0.0));
        assert_eq!(operational_result_profit(0.0, 0.0), Some(0.0));
        assert_eq!(operational_result_profit(5.0, 0.0), None);
    }

    #[test]
    fn test_deferred_income_reliance_threshold() {
        assert_eq!(
            deferred_income_reliance(5_000_000.0, 100_000_000.0),
            Some(false)
        );
        assert_eq!(
            deferred_income_reliance(60_000_000.0, 100_000_000.0),
            Some(true)
        );
        // Exactly at the threshold flags.
        assert_eq!(
            deferred_income_reliance(50_000_000.0, 100_000_000.0),
            Some(true)
        );
    }

    #[test]
    fn test_deferred_income_reliance_invalid_funding() {
        assert_eq!(deferred_income_reliance(5_000_000.0, 0.0), None);
        assert_eq!(deferred_income_reliance(5_000_000.0, -1.0), None);
    }

    #[test]
    fn test_regular_fiscal_year() {
        assert!(!check_for_irregular_fiscal_year(
            date(2023, 1, 1),
            date(2023, 12, 31)
        ));
    }

    #[test]
    fn test_short_fiscal_year_is_irregular() {
        assert!(check_for_irregular_fiscal_year(
            date(2023, 1, 1),
            date(2023, 11, 30)
        ));
        assert!(check_for_irregular_fiscal_year(
            date(2023, 1, 1),
            date(2023, 1, 31)
        ));
    }

    #[test]
    fn test_fiscal_year_crossing_calendar_years() {
        // Jul 2023 - Jun 2024 is a regular 12-month year.
        assert!(!check_for_irregular_fiscal_year(
            date(2023, 7, 1),
            date(2024, 6, 30)
        ));
        // Jul 2023 - Mar 2024 is short.
        assert!(check_for_irregular_fiscal_year(
            date(2023, 7, 1),
            date(2024, 3, 31)
        ));
    }

    #[test]
    fn test_compliance_status_recent_filing() {
        let filings = vec![
            filing(Some(date(2022, 1, 10)), "Gründung"),
            filing(Some(date(2023, 5, 15)), "Jahresabschluss 2022"),
        ];
        assert_eq!(
            check_compliance_status(&filings, date(2024, 1, 1)),
            Some(true)
        );
    }

    #[test]
    fn test_compliance_status_stale_filings() {
        let filings = vec![
            filing(Some(date(2020, 3, 3)), "Gründung"),
            filing(Some(date(2021, 5, 20)), "Jahresabschluss 2020"),
        ];
        assert_eq!(
            check_compliance_status(&filings, date(2024, 1, 1)),
            Some(false)
        );
    }

    #[test]
    fn test_compliance_status_window_boundary() {
        let as_of = date(2024, 1, 1);
        let on_boundary = vec![filing(Some(as_of - chrono::Days::new(548)), "Eintragung")];
        assert_eq!(check_compliance_status(&on_boundary, as_of), Some(true));

        let past_boundary = vec![filing(Some(as_of - chrono::Days::new(549)), "Eintragung")];
        assert_eq!(check_compliance_status(&past_boundary, as_of), Some(false));
    }

    #[test]
    fn test_compliance_status_no_filings_is_non_compliant() {
        let filings: Vec<RegistryFilingEntry> = vec![];
        assert_eq!(check_compliance_status(&filings, date(2024, 1, 1)), Some(false));
    }

    #[test]
    fn test_compliance_status_only_undated_filings_is_unknown() {
        let filings = vec![filing(None, "Angekündigt")];
        assert_eq!(check_compliance_status(&filings, date(2024, 1, 1)), None);
    }

    #[test]
    fn test_compliance_status_undated_entries_do_not_invalidate_dated_ones() {
        let filings = vec![
            filing(None, "Angekündigt"),
            filing(Some(date(2023, 6, 1)), "Jahresabschluss 2022"),
        ];
        assert_eq!(
            check_compliance_status(&filings, date(2024, 1, 1)),
            Some(true)
        );
    }
}
