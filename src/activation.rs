//! Activation function for NEAT phenotypes.
//!
//! Every non-input neuron uses a logistic sigmoid whose steepness is set by
//! the neuron's evolvable activation response.

/// Logistic sigmoid `1 / (1 + e^(-x / response))`.
///
/// NaN propagates. Infinite arguments saturate to 0.0 or 1.0, and the scaled
/// argument is clamped so `exp` never overflows.
#[inline]
#[must_use]
pub fn sigmoid(net_input: f64, response: f64) -> f64 {
    let x = net_input / response;
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    // exp(709) is the largest finite double.
    let clamped = x.clamp(-700.0, 700.0);
    1.0 / (1.0 + (-clamped).exp())
}
