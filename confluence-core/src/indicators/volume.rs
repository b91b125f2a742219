//! Volume confirmation.
//!
//! `volume_ratio` compares the latest volume with an instrument baseline. It
//! is a confirmation weight only and never triggers a signal on its own.

/// Current volume divided by `baseline`. A non-positive or non-finite
/// baseline (or volume) reads as 1.0, i.e. "normal".
pub fn volume_ratio(volume: f64, baseline: f64) -> f64 {
    if !(baseline.is_finite() && baseline > 0.0) || !volume.is_finite() || volume < 0.0 {
        return 1.0;
    }
    volume / baseline
}

/// Mean volume of the `window` bars preceding the latest one.
///
/// Uses whatever prior bars exist when fewer than `window` are available. With
/// no prior bar at all, the latest volume is its own baseline.
pub fn trailing_average_volume(volumes: &[f64], window: usize) -> f64 {
    let Some((&latest, prior)) = volumes.split_last() else {
        return 0.0;
    };
    let take = window.min(prior.len());
    if take == 0 {
        return latest;
    }
    prior[prior.len() - take..].iter().sum::<f64>() / take as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_against_baseline() {
        assert_eq!(volume_ratio(150.0, 100.0), 1.5);
    }

    #[test]
    fn bad_baseline_is_neutral() {
        assert_eq!(volume_ratio(150.0, 0.0), 1.0);
        assert_eq!(volume_ratio(150.0, f64::NAN), 1.0);
    }

    #[test]
    fn trailing_average_excludes_latest() {
        let v = [100.0, 200.0, 300.0, 1_000.0];
        assert_eq!(trailing_average_volume(&v, 2), 250.0);
        assert_eq!(trailing_average_volume(&v, 10), 200.0);
    }

    #[test]
    fn trailing_average_single_bar() {
        assert_eq!(trailing_average_volume(&[500.0], 20), 500.0);
        assert_eq!(trailing_average_volume(&[], 20), 0.0);
    }
}
