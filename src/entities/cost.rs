/// Final mission cost in whole currency units: total distance priced at
/// the per-kilometre rate. Callers only invoke this once a rate is known.
pub fn compute_final_cost(total_distance_km: f64, rate_per_km: f64) -> f64 {
    (total_distance_km * rate_per_km).round()
}

#[test]
fn cost_is_distance_times_rate() {
    assert_eq!(compute_final_cost(20.0, 5000.0), 100000.0);
    assert_eq!(compute_final_cost(0.0, 5000.0), 0.0);
    assert_eq!(compute_final_cost(12.5, 3.0), 38.0);
}

#[test]
fn zero_rate_costs_nothing() {
    for distance in [0.0, 0.01, 20.0, 1234.56] {
        assert_eq!(compute_final_cost(distance, 0.0), 0.0);
    }
}

#[test]
fn whole_unit_products_are_exact() {
    for distance in [1.0, 7.0, 20.0, 350.0] {
        for rate in [0.0, 1.0, 4500.0, 5000.0] {
            assert_eq!(compute_final_cost(distance, rate), distance * rate);
        }
    }
}
