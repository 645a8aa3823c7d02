use super::models::{ContractCandidate, Opportunity, ScreenFilters, SkipReason};
use chrono::NaiveDate;
use serde::Serialize;

/// Covered-call metrics for one contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoveredCallMetrics {
    pub breakeven: f64,
    pub downside_protection_pct: f64,
    pub profit_if_assigned: f64,
    pub return_if_assigned_pct: f64,
    pub annualized_roi_pct: f64,
}

/// Metrics for stock price `s`, strike `k`, premium `p` over `dte` days.
/// Returns None for `dte <= 0` or a non-positive stock price.
pub fn calculate_metrics(s: f64, k: f64, p: f64, dte: i64) -> Option<CoveredCallMetrics> {
    if dte <= 0 || s <= 0.0 {
        return None;
    }

    let breakeven = s - p;
    let downside_protection_pct = p / s * 100.0;

    // Per 100-share lot
    let profit_if_assigned = (k - s + p) * 100.0;
    let return_if_assigned_pct = profit_if_assigned / (s * 100.0) * 100.0;
    let annualized_roi_pct = return_if_assigned_pct * (365.0 / dte as f64);

    Some(CoveredCallMetrics {
        breakeven,
        downside_protection_pct,
        profit_if_assigned,
        return_if_assigned_pct,
        annualized_roi_pct,
    })
}

/// Apply the screen to one normalized contract.
///
/// Checks run in a fixed order and the first failure decides the skip reason:
/// DTE range, in-the-money, open interest, bid, zero DTE, minimum premium,
/// minimum annualized ROI.
pub fn evaluate(
    ticker: &str,
    stock_price: f64,
    candidate: &ContractCandidate,
    today: NaiveDate,
    filters: &ScreenFilters,
) -> Result<Opportunity, SkipReason> {
    // Recomputed from the expiration so a stale candidate cannot leak through
    let dte = (candidate.expiration - today).num_days();
    if dte < 0 {
        return Err(SkipReason::Expired);
    }

    if dte < filters.dte_min || dte > filters.dte_max {
        return Err(SkipReason::DteOutOfRange);
    }

    if candidate.strike >= stock_price {
        return Err(SkipReason::NotInTheMoney);
    }

    if candidate.open_interest < filters.min_open_interest {
        return Err(SkipReason::LowOpenInterest);
    }

    if !(candidate.bid.is_finite() && candidate.bid > 0.0) {
        return Err(SkipReason::NoBid);
    }
    let premium = candidate.bid;

    if dte == 0 {
        return Err(SkipReason::ZeroDte);
    }

    let metrics =
        calculate_metrics(stock_price, candidate.strike, premium, dte).ok_or(SkipReason::ZeroDte)?;

    if premium < filters.min_premium {
        return Err(SkipReason::PremiumBelowMin);
    }

    if metrics.annualized_roi_pct < filters.min_annualized_roi {
        return Err(SkipReason::RoiBelowMin);
    }

    Ok(Opportunity::new(
        ticker.trim().to_uppercase(),
        stock_price,
        candidate.strike,
        candidate.expiration,
        dte,
        premium,
        metrics.return_if_assigned_pct,
        metrics.breakeven,
        metrics.downside_protection_pct,
        metrics.annualized_roi_pct,
        candidate.open_interest,
    ))
}
