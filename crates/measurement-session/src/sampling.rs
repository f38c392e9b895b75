use rand::Rng;

/// Decide whether a brand-new visitor should be tracked.
///
/// `selector` draws a value in `[0, 100)`; the visitor is included when the
/// draw is below `sample_rate`. A rate of 0 excludes everyone and a rate of
/// 100 includes everyone regardless of the selector.
pub fn should_track_this_new_visitor(sample_rate: f64, selector: impl FnOnce() -> f64) -> bool {
    if sample_rate <= 0.0 {
        return false;
    }
    if sample_rate >= 100.0 {
        return true;
    }
    selector() < sample_rate
}

/// Uniform random draw in `[0, 100)`.
pub fn random_selector() -> f64 {
    rand::thread_rng().gen_range(0.0..100.0)
}
