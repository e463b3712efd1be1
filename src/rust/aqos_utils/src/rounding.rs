/// Rounds `value` to `places` decimal places, half away from zero.
pub fn round_dp(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}
