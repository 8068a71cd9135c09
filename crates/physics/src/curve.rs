use std::fmt;
use std::sync::Arc;

/// Scalar profile over normalized chain depth `[0, 1]`.
///
/// Sampled once per particle at build time to modulate a coefficient.
#[derive(Clone)]
pub struct Curve(Arc<dyn Fn(f32) -> f32 + Send + Sync>);

impl Curve {
    pub fn new(f: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(move |_| value)
    }

    /// Straight line from `start` at the root to `end` at the deepest tip.
    #[must_use]
    pub fn linear(start: f32, end: f32) -> Self {
        Self::new(move |t| start + (end - start) * t)
    }

    /// Piecewise-linear curve through `(t, value)` keys.
    ///
    /// Keys are sorted by `t`; samples outside the key range hold the end
    /// values. An empty key list samples as `1.0`.
    #[must_use]
    pub fn keyframes(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::new(move |t| sample_keys(&keys, t))
    }

    #[must_use]
    pub fn sample(&self, t: f32) -> f32 {
        (self.0)(t.clamp(0.0, 1.0))
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Curve(..)")
    }
}

fn sample_keys(keys: &[(f32, f32)], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 1.0;
    };
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.0 {
            let span = b.0 - a.0;
            if span <= 0.0 {
                return b.1;
            }
            return a.1 + (b.1 - a.1) * ((t - a.0) / span);
        }
    }
    last.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_endpoints() {
        let c = Curve::linear(1.0, 0.0);
        assert_eq!(c.sample(0.0), 1.0);
        assert_eq!(c.sample(1.0), 0.0);
        assert!((c.sample(0.25) - 0.75).abs() < 1e-6);
        // Clamped outside [0, 1].
        assert_eq!(c.sample(2.0), 0.0);
    }

    #[test]
    fn keyframes_interpolate_and_hold() {
        let c = Curve::keyframes(vec![(1.0, 0.5), (0.0, 1.0), (0.5, 0.0)]);
        assert_eq!(c.sample(0.0), 1.0);
        assert!((c.sample(0.25) - 0.5).abs() < 1e-6);
        assert_eq!(c.sample(0.5), 0.0);
        assert!((c.sample(0.75) - 0.25).abs() < 1e-6);

        let empty = Curve::keyframes(Vec::new());
        assert_eq!(empty.sample(0.3), 1.0);
    }
}
