//! Post-calculation invariant checks.
//!
//! A failure here is a programming error in the engine; callers surface it as
//! an internal error instead of clamping and continuing.

use furrow_protocol::{Round, FIELD_SIZE};

use crate::error::{EngineError, EngineResult};

pub fn check_round(round: &Round, previous_capital: f64) -> EngineResult<()> {
    if round.parcels.len() != FIELD_SIZE {
        return Err(violation(format!(
            "round {} has {} parcels",
            round.number,
            round.parcels.len()
        )));
    }

    for parcel in &round.parcels {
        if !parcel.in_bounds() {
            return Err(violation(format!(
                "parcel {} soil {} or nutrition {} out of bounds",
                parcel.index, parcel.soil, parcel.nutrition
            )));
        }
        if !parcel.harvest_yield.is_finite() || parcel.harvest_yield < 0.0 {
            return Err(violation(format!(
                "parcel {} yield {} is not a finite non-negative value",
                parcel.index, parcel.harvest_yield
            )));
        }
    }

    let Some(result) = &round.result else {
        return Ok(());
    };

    let values = [
        result.income,
        result.expenses.total,
        result.profit,
        result.capital,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(violation(format!(
            "round {} has non-finite financials",
            round.number
        )));
    }
    if result.profit != result.income - result.expenses.total {
        return Err(violation(format!(
            "profit {} != income {} - expenses {}",
            result.profit, result.income, result.expenses.total
        )));
    }
    if result.capital != previous_capital + result.profit {
        return Err(violation(format!(
            "capital {} != previous {} + profit {}",
            result.capital, previous_capital, result.profit
        )));
    }
    Ok(())
}

fn violation(message: String) -> EngineError {
    EngineError::InvariantViolation(message)
}
