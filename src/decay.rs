use crate::error::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<()> {
    ((rate >= 0.0 && vi > vf) || (rate < 0.0 && vi < vf))
        .then_some(())
        .ok_or_else(|| Error::InvalidConfig(String::from("`vi - vf` must have same sign as `rate`")))
}

/// A constant value, used to pin exploration in tests
#[cfg(test)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

#[cfg(test)]
impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

#[cfg(test)]
impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Exponential {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// The value at `t = 0`
    pub fn start(&self) -> f32 {
        self.vi
    }

    /// The asymptote approached as `t` grows
    pub fn end(&self) -> f32 {
        self.vf
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_functional() {
        assert!(validate(1.0, 1.0, 0.0).is_ok());
        assert!(validate(1.0, -1.0, 0.0).is_err());
        assert!(validate(-1.0, 1.0, 0.0).is_err());
        assert!(validate(-1.0, -1.0, 0.0).is_ok());
    }

    #[test]
    fn constant_decay() {
        let x = Constant::new(1.0);
        assert_eq!(x.evaluate(0.0), 1.0);
        assert_eq!(x.evaluate(1.0), 1.0);
    }

    #[test]
    fn exponential_decay() {
        let x = Exponential::new(2.0, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 0.5 + 1.5 * f32::exp(-2.0));
    }

    #[test]
    fn exponential_decay_is_bounded_and_non_increasing() {
        let x = Exponential::new(1e-5, 1.0, 0.1).unwrap();
        assert_eq!(x.evaluate(0.0), x.start(), "starts at vi");

        let mut previous = x.evaluate(0.0);
        for t in (0..2_000_000).step_by(997) {
            let value = x.evaluate(t as f32);
            assert!(value <= previous, "non-increasing at t = {t}");
            assert!(
                value >= x.end() && value <= x.start(),
                "bounded at t = {t}"
            );
            previous = value;
        }
    }
}
