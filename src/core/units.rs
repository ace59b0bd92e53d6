/// Grams per avoirdupois pound.
pub const LBS_TO_GRAMS: f64 = 453.59237;

pub fn lbs_to_grams(lbs: u64) -> u64 {
    (lbs as f64 * LBS_TO_GRAMS).round() as u64
}

/// Outbound integer weight: `max(floor, round(total))`. Clamps silently.
pub fn billable_lbs(total_lbs: f64, floor_lbs: u64) -> u64 {
    let rounded = if total_lbs.is_finite() && total_lbs > 0.0 {
        total_lbs.round() as u64
    } else {
        0
    };
    rounded.max(floor_lbs)
}
