/// STREAM core process functions.
///
/// Pure per-cell functions for each routine of a monthly step: snow,
/// Thornthwaite potential evapotranspiration, Thornthwaite-Mather soil
/// storage and groundwater flow separation. All depths are in mm/month.
use super::constants::{
    ALPHA_COEFFS, HEAT_INDEX_DIVISOR, HEAT_INDEX_EXPONENT, MM_PER_M, PET_HIGH_TEMP,
    PET_HIGH_TEMP_COEFFS, PET_SCALE, REFERENCE_DAYLIGHT_HOURS,
};

/// Step 1: Snow accumulation and melt.
///
/// Precipitation falls as snow at or below `temp_snow_fall`. Melt is
/// `melt_coeff * (temp - temp_snow_melt)` above the melt threshold, limited
/// by the available pack.
/// Returns (liquid, snow_accum, snowfall, melt):
/// - liquid: rain plus melt reaching the soil [mm]
/// - snow_accum: pack after the month [mm]
/// - snowfall: precipitation retained as snow [mm]
/// - melt: melted snow [mm]
pub fn snow(
    precip: f64,
    temp: f64,
    snow_prev: f64,
    temp_snow_fall: f64,
    temp_snow_melt: f64,
    melt_coeff: f64,
) -> (f64, f64, f64, f64) {
    let snowfall = if temp > temp_snow_fall { 0.0 } else { precip };
    let pack = snow_prev + snowfall;

    let potential_melt = if temp < temp_snow_melt {
        0.0
    } else {
        melt_coeff * (temp - temp_snow_melt)
    };
    let melt = pack.min(potential_melt);

    let liquid = precip - snowfall + melt;

    (liquid, pack - melt, snowfall, melt)
}

/// Step 2: Thornthwaite potential evapotranspiration [mm/month].
///
/// `heat_index` and `alpha` are the annual heat index and exponent of the
/// cell. The result is scaled by day length relative to 12 hours; the crop
/// factor correction is applied by the caller.
pub fn potential_evapotranspiration(
    temp: f64,
    heat_index: f64,
    alpha: f64,
    daylight_hours: f64,
) -> f64 {
    let unadjusted = if temp >= PET_HIGH_TEMP {
        let (a, b, c) = PET_HIGH_TEMP_COEFFS;
        a + b * temp + c * temp * temp
    } else if temp > 0.0 {
        // A cell without any warm month has no heat index to scale against.
        if heat_index > 0.0 {
            PET_SCALE * (10.0 * temp / heat_index).powf(alpha)
        } else {
            0.0
        }
    } else {
        0.0
    };

    unadjusted * daylight_hours / REFERENCE_DAYLIGHT_HOURS
}

/// Step 3: Thornthwaite-Mather soil storage.
///
/// Effective precipitation `liquid - pet` wets the soil up to `whc`; any
/// surplus is excess. When it is negative the soil dries exponentially.
/// A NaN effective precipitation leaves the soil as it was, without excess.
/// Returns (excess, available):
/// - excess: water leaving the soil column [mm]
/// - available: soil water after the month [mm]
pub fn soil_storage(liquid: f64, pet: f64, available_prev: f64, whc: f64) -> (f64, f64) {
    let effective = liquid - pet;

    if effective.is_nan() {
        return (0.0, available_prev);
    }
    if effective <= 0.0 {
        return (0.0, available_prev * (effective / whc).exp());
    }

    let wetted = available_prev + effective;
    if wetted <= whc {
        (0.0, wetted)
    } else {
        (wetted - whc, whc)
    }
}

/// Step 4: Split soil excess into runoff and groundwater recharge, then
/// drain the groundwater reservoir.
/// Returns (runoff, recharge, base_flow, ground_water):
/// - runoff: direct runoff [mm]
/// - recharge: excess entering groundwater [mm]
/// - base_flow: groundwater released to the stream [mm]
/// - ground_water: groundwater storage after the month [mm]
pub fn separate_flow(excess: f64, ground_water_prev: f64, togw: f64, c: f64) -> (f64, f64, f64, f64) {
    let runoff = (1.0 - togw) * excess;
    let recharge = excess - runoff;

    let store = ground_water_prev + recharge;
    let base_flow = store * c;

    (runoff, recharge, base_flow, store - base_flow)
}

/// Step 5: Convert a water depth [mm] over a cell into a volume.
///
/// With the cell area in m², the result is in m³.
#[inline]
pub fn outflow_volume(depth_mm: f64, cell_area: f64) -> f64 {
    depth_mm / MM_PER_M * cell_area
}

/// Monthly contribution `(T / 5)^1.514` to the annual heat index.
///
/// Freezing months contribute nothing; NaN temperatures count as 0.
#[inline]
pub fn heat_index_term(temp: f64) -> f64 {
    if temp > 0.0 {
        (temp / HEAT_INDEX_DIVISOR).powf(HEAT_INDEX_EXPONENT)
    } else {
        0.0
    }
}

/// Thornthwaite (1948) exponent from the annual heat index.
#[inline]
pub fn compute_alpha(heat_index: f64) -> f64 {
    let [a0, a1, a2, a3] = ALPHA_COEFFS;
    a0 + heat_index * (a1 + heat_index * (a2 + heat_index * a3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -- Step 1: Snow --

    #[test]
    fn warm_month_has_no_snowfall() {
        let (liquid, pack, snowfall, melt) = snow(80.0, 10.0, 0.0, 2.0, 0.0, 15.0);
        assert_eq!(snowfall, 0.0);
        assert_eq!(melt, 0.0);
        assert_eq!(pack, 0.0);
        assert_eq!(liquid, 80.0);
    }

    #[test]
    fn cold_month_accumulates() {
        let (liquid, pack, snowfall, melt) = snow(50.0, -3.0, 20.0, 2.0, 0.0, 15.0);
        assert_eq!(snowfall, 50.0);
        assert_eq!(melt, 0.0);
        assert_eq!(pack, 70.0);
        assert_eq!(liquid, 0.0);
    }

    #[test]
    fn snowfall_and_melt_in_same_month() {
        // 1 °C: below the snowfall threshold but above the melt threshold.
        let (liquid, pack, snowfall, melt) = snow(30.0, 1.0, 10.0, 2.0, 0.0, 15.0);
        assert_eq!(snowfall, 30.0);
        assert_eq!(melt, 15.0);
        assert_eq!(pack, 25.0);
        assert_eq!(liquid, 15.0);
    }

    #[test]
    fn melt_limited_by_pack() {
        let (liquid, pack, _, melt) = snow(0.0, 10.0, 40.0, 2.0, 0.0, 15.0);
        assert_eq!(melt, 40.0);
        assert_eq!(pack, 0.0);
        assert_eq!(liquid, 40.0);
    }

    #[test]
    fn snow_conserves_water() {
        let (precip, prev) = (42.0, 17.0);
        let (liquid, pack, _, _) = snow(precip, 1.5, prev, 2.0, 0.0, 15.0);
        assert_relative_eq!(liquid + pack, precip + prev, epsilon = 1e-12);
    }

    // -- Step 2: PET --

    #[test]
    fn pet_zero_when_freezing() {
        assert_eq!(potential_evapotranspiration(-4.0, 40.0, 1.1, 12.0), 0.0);
        assert_eq!(potential_evapotranspiration(0.0, 40.0, 1.1, 12.0), 0.0);
    }

    #[test]
    fn pet_mid_range_thornthwaite() {
        // 16 * (10 * 15 / 60)^1.5 = 16 * 2.5^1.5
        let pe = potential_evapotranspiration(15.0, 60.0, 1.5, 12.0);
        assert_relative_eq!(pe, 16.0 * 2.5_f64.powf(1.5), epsilon = 1e-10);
    }

    #[test]
    fn pet_high_temperature_branch() {
        let t: f64 = 30.0;
        let expected = -415.85 + 32.24 * t - 0.43 * t * t;
        assert_relative_eq!(
            potential_evapotranspiration(t, 1.0, 1.0, 12.0),
            expected,
            epsilon = 1e-10
        );
    }

    #[test]
    fn pet_scales_with_daylight() {
        let base = potential_evapotranspiration(12.0, 50.0, 1.2, 12.0);
        let long = potential_evapotranspiration(12.0, 50.0, 1.2, 15.0);
        assert_relative_eq!(long, base * 15.0 / 12.0, epsilon = 1e-10);
    }

    #[test]
    fn pet_zero_heat_index_is_finite() {
        assert_eq!(potential_evapotranspiration(10.0, 0.0, 0.49, 12.0), 0.0);
    }

    // -- Step 3: Soil storage --

    #[test]
    fn soil_wets_below_capacity() {
        let (excess, aw) = soil_storage(60.0, 20.0, 30.0, 150.0);
        assert_eq!(excess, 0.0);
        assert_eq!(aw, 70.0);
    }

    #[test]
    fn soil_spills_above_capacity() {
        let (excess, aw) = soil_storage(120.0, 20.0, 80.0, 150.0);
        assert_eq!(aw, 150.0);
        assert_eq!(excess, 30.0);
    }

    #[test]
    fn soil_dries_exponentially() {
        let (excess, aw) = soil_storage(10.0, 40.0, 100.0, 150.0);
        assert_eq!(excess, 0.0);
        assert_relative_eq!(aw, 100.0 * (-30.0_f64 / 150.0).exp(), epsilon = 1e-12);
        assert!(aw < 100.0 && aw > 0.0);
    }

    #[test]
    fn soil_zero_effective_precipitation_keeps_storage() {
        let (excess, aw) = soil_storage(20.0, 20.0, 55.0, 150.0);
        assert_eq!(excess, 0.0);
        assert_eq!(aw, 55.0);
    }

    #[test]
    fn soil_nan_effective_precipitation_keeps_storage() {
        let (excess, aw) = soil_storage(f64::NAN, 10.0, 5.0, 100.0);
        assert_eq!(excess, 0.0);
        assert_eq!(aw, 5.0);
    }

    // -- Step 4: Flow separation --

    #[test]
    fn flow_separation_balances() {
        let (runoff, recharge, base_flow, gw) = separate_flow(40.0, 10.0, 0.5, 0.2);
        assert_eq!(runoff, 20.0);
        assert_eq!(recharge, 20.0);
        assert_relative_eq!(base_flow, 6.0);
        assert_relative_eq!(gw, 24.0);
        assert_relative_eq!(runoff + base_flow + gw, 40.0 + 10.0);
    }

    #[test]
    fn flow_separation_without_excess_drains_groundwater() {
        let (runoff, recharge, base_flow, gw) = separate_flow(0.0, 50.0, 0.5, 0.2);
        assert_eq!(runoff, 0.0);
        assert_eq!(recharge, 0.0);
        assert_relative_eq!(base_flow, 10.0);
        assert_relative_eq!(gw, 40.0);
    }

    // -- Step 5 and heat index helpers --

    #[test]
    fn outflow_volume_converts_mm_to_m3() {
        // 10 mm over a 100 m x 100 m cell
        assert_relative_eq!(outflow_volume(10.0, 10_000.0), 100.0);
    }

    #[test]
    fn heat_index_term_values() {
        assert_eq!(heat_index_term(-2.0), 0.0);
        assert_eq!(heat_index_term(0.0), 0.0);
        assert_eq!(heat_index_term(f64::NAN), 0.0);
        assert_relative_eq!(heat_index_term(5.0), 1.0);
        assert_relative_eq!(heat_index_term(20.0), 4.0_f64.powf(1.514), epsilon = 1e-12);
    }

    #[test]
    fn alpha_polynomial() {
        assert_relative_eq!(compute_alpha(0.0), 0.49239);
        let i: f64 = 50.0;
        let expected = 0.49239 + 0.01792 * i - 0.0000771771 * i * i + 0.000000675 * i * i * i;
        assert_relative_eq!(compute_alpha(i), expected, epsilon = 1e-12);
    }
}
