//! Rental, return, forecast and risk figures derived from a finished valuation.

use crate::domain::{BlendedEstimate, Condition, Insights, PropertyInput};
use crate::factors::{FactorTable, ForecastParams, RentYields};

/// Demand index at or above which the high-demand yield applies.
pub const HIGH_DEMAND: f64 = 0.75;
/// Demand index at or above which the medium-demand yield applies.
pub const MEDIUM_DEMAND: f64 = 0.25;

/// Share of the year the property is assumed to be let.
pub const OCCUPANCY_RATE: f64 = 0.9;
/// Running expenses as a share of gross annual rent.
pub const EXPENSE_RATIO: f64 = 0.1;

pub fn derive(input: &PropertyInput, estimate: &BlendedEstimate, table: &FactorTable) -> Insights {
    let price = estimate.final_price;
    let rent_yield = rent_yield(input.demand_index, &table.rent_yields);
    let annual_rent = price * rent_yield;
    let (future_price_1yr, future_price_3yr) = forecast(price, &table.forecast);
    Insights {
        rent_yield,
        annual_rent,
        risk_score: risk_score(input),
        roi: roi(annual_rent, price),
        future_price_1yr,
        future_price_3yr,
    }
}

/// `(rent * occupancy - expenses) / price`; zero for a non-positive price.
pub fn roi(annual_rent: f64, price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    let expenses = annual_rent * EXPENSE_RATIO;
    (annual_rent * OCCUPANCY_RATE - expenses) / price
}

/// Prices 1 and 3 years out: compounded appreciation, discounted for volatility.
pub fn forecast(price: f64, params: &ForecastParams) -> (f64, f64) {
    let growth = 1.0 + params.appreciation;
    let one = price * growth * (1.0 - params.volatility * 0.3);
    let three = price * growth.powi(3) * (1.0 - params.volatility * 0.5);
    (one, three)
}

pub fn rent_yield(demand_index: f64, yields: &RentYields) -> f64 {
    if demand_index >= HIGH_DEMAND {
        yields.high_demand
    } else if demand_index >= MEDIUM_DEMAND {
        yields.medium_demand
    } else {
        yields.low_demand
    }
}

/// Risk in `[0, 1]`, higher is riskier.
pub fn risk_score(input: &PropertyInput) -> f64 {
    let crime = input.crime_index.max(0.0).min(1.0);
    let demand_shortfall = (0.5 - input.demand_index).max(0.0).min(0.5);
    let condition = match input.condition {
        Condition::Excellent => 0.0,
        Condition::Good => 0.05,
        Condition::Fair => 0.1,
        Condition::Poor => 0.25,
    };
    let age = (f64::from(input.age) * 0.002).min(0.15);

    (crime * 0.25 + demand_shortfall * 0.2 + condition + age).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyType;

    fn input() -> PropertyInput {
        PropertyInput {
            location: "general".to_string(),
            property_type: PropertyType::House,
            area: 150.0,
            age: 10,
            condition: Condition::Good,
            floor: 0,
            total_floors: 2,
            amenity_count: 2,
            demand_index: 0.5,
            crime_index: 0.2,
        }
    }

    #[test]
    fn rent_yield_is_tiered_by_demand() {
        let yields = RentYields::default();
        assert_eq!(rent_yield(0.9, &yields), 0.08);
        assert_eq!(rent_yield(0.75, &yields), 0.08);
        assert_eq!(rent_yield(0.5, &yields), 0.05);
        assert_eq!(rent_yield(0.1, &yields), 0.03);
    }

    #[test]
    fn roi_nets_out_vacancy_and_expenses() {
        // 0.9 occupancy, 10% expenses: 8000 rent on 100k -> 6400 net.
        assert!((roi(8_000.0, 100_000.0) - 0.064).abs() < 1e-12);
        assert_eq!(roi(8_000.0, 0.0), 0.0);
    }

    #[test]
    fn forecast_compounds_and_discounts_volatility() {
        let (one, three) = forecast(100_000.0, &ForecastParams::default());
        assert!((one - 100_000.0 * 1.03 * 0.97).abs() < 1e-6);
        assert!((three - 100_000.0 * 1.03f64.powi(3) * 0.95).abs() < 1e-6);

        let flat = ForecastParams {
            appreciation: 0.0,
            volatility: 0.0,
        };
        assert_eq!(forecast(250_000.0, &flat), (250_000.0, 250_000.0));
    }

    #[test]
    fn derive_uses_the_final_price() {
        let table = FactorTable::load().unwrap();
        let rule = crate::engine::evaluate(&input(), &table).unwrap();
        let estimate = crate::blend::blend(
            rule,
            crate::domain::MlEstimate::unavailable(crate::domain::UnavailableReason::ArtifactMissing),
            0.3,
        )
        .unwrap();
        let insights = derive(&input(), &estimate, &table);

        let price = estimate.final_price;
        assert_eq!(insights.rent_yield, 0.05);
        assert!((insights.annual_rent - price * 0.05).abs() < 1e-6);
        assert!((insights.roi - 0.05 * 0.8).abs() < 1e-12);
        assert!(insights.future_price_1yr < insights.future_price_3yr);
    }

    #[test]
    fn risk_combines_components_and_stays_bounded() {
        // 0.2 * 0.25 + 0 + 0.05 + 10 * 0.002
        assert!((risk_score(&input()) - 0.12).abs() < 1e-12);

        let worst = PropertyInput {
            crime_index: 5.0,
            demand_index: -3.0,
            condition: Condition::Poor,
            age: 1000,
            ..input()
        };
        let score = risk_score(&worst);
        assert!((0.0..=1.0).contains(&score));
        assert!(score > risk_score(&input()));
    }
}
