//! Interpolation of continuation values over an inventory grid.
//!
//! The backward sweep evaluates storage value on a discrete set of inventories and
//! needs the value at arbitrary post-decision inventories; interpolators built here
//! fill that gap. Factories let the engine stay agnostic of the scheme in use.
//!
//! References:
//! - Fritsch and Carlson (1980), monotone piecewise cubic interpolation.

use serde::{Deserialize, Serialize};

/// Extrapolation behavior outside the node range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationMode {
    /// Keep the endpoint value constant.
    Flat,
    /// Extend using endpoint slope.
    #[default]
    Linear,
    /// Return an error outside node range.
    Error,
}

/// Errors returned by interpolators.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationError {
    InvalidInput(&'static str),
    ExtrapolationDisabled,
}

/// Continuous function through discrete `(x, y)` nodes.
pub trait Interpolator: std::fmt::Debug + Send + Sync {
    /// Returns interpolated value `y(x)`.
    fn value(&self, x: f64) -> Result<f64, InterpolationError>;

    /// Returns interpolation abscissas.
    fn x(&self) -> &[f64];

    /// Returns interpolation ordinates.
    fn y(&self) -> &[f64];
}

/// Builds an interpolator from grid inventories and their values.
pub trait InterpolatorFactory: Send + Sync {
    fn create(
        &self,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Box<dyn Interpolator>, InterpolationError>;
}

/// Interpolation scheme selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    #[default]
    Linear,
    HermiteMonotone,
}

impl InterpolationKind {
    pub fn factory(self, extrapolation: ExtrapolationMode) -> Box<dyn InterpolatorFactory> {
        match self {
            Self::Linear => Box::new(LinearInterpolatorFactory { extrapolation }),
            Self::HermiteMonotone => Box::new(HermiteMonotoneInterpolatorFactory { extrapolation }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryLocation {
    /// Single node; the function is constant.
    Single,
    Left,
    Inside(usize),
    Right,
}

fn validate_xy(x: &[f64], y: &[f64]) -> Result<(), InterpolationError> {
    if x.len() != y.len() {
        return Err(InterpolationError::InvalidInput(
            "x and y must have same length",
        ));
    }
    if x.is_empty() {
        return Err(InterpolationError::InvalidInput(
            "at least one interpolation node is required",
        ));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpolationError::InvalidInput(
            "x must be strictly increasing",
        ));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(InterpolationError::InvalidInput("x and y must be finite"));
    }
    Ok(())
}

fn query_location(x: &[f64], xq: f64) -> QueryLocation {
    let n = x.len();
    if n == 1 {
        return QueryLocation::Single;
    }
    if xq < x[0] {
        return QueryLocation::Left;
    }
    if xq > x[n - 1] {
        return QueryLocation::Right;
    }
    let idx = x.partition_point(|v| *v <= xq);
    QueryLocation::Inside(idx.clamp(1, n - 1) - 1)
}

/// Resolves a query outside the nodes from the endpoint value and slope.
#[inline]
fn extrapolate(
    mode: ExtrapolationMode,
    x_end: f64,
    y_end: f64,
    slope_end: f64,
    xq: f64,
) -> Result<f64, InterpolationError> {
    match mode {
        ExtrapolationMode::Flat => Ok(y_end),
        ExtrapolationMode::Linear => Ok(y_end + slope_end * (xq - x_end)),
        ExtrapolationMode::Error => Err(InterpolationError::ExtrapolationDisabled),
    }
}

fn single_node_value(
    mode: ExtrapolationMode,
    x0: f64,
    y0: f64,
    xq: f64,
) -> Result<f64, InterpolationError> {
    if mode == ExtrapolationMode::Error && xq != x0 {
        return Err(InterpolationError::ExtrapolationDisabled);
    }
    Ok(y0)
}

/// Piecewise-linear interpolation in `y`.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    extrapolation: ExtrapolationMode,
}

impl LinearInterpolator {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        extrapolation: ExtrapolationMode,
    ) -> Result<Self, InterpolationError> {
        validate_xy(&x, &y)?;
        Ok(Self {
            x,
            y,
            extrapolation,
        })
    }

    #[inline]
    fn segment_slope(&self, i: usize) -> f64 {
        (self.y[i + 1] - self.y[i]) / (self.x[i + 1] - self.x[i])
    }
}

impl Interpolator for LinearInterpolator {
    fn value(&self, xq: f64) -> Result<f64, InterpolationError> {
        let n = self.x.len();
        match query_location(&self.x, xq) {
            QueryLocation::Single => single_node_value(self.extrapolation, self.x[0], self.y[0], xq),
            QueryLocation::Left => {
                extrapolate(self.extrapolation, self.x[0], self.y[0], self.segment_slope(0), xq)
            }
            QueryLocation::Right => extrapolate(
                self.extrapolation,
                self.x[n - 1],
                self.y[n - 1],
                self.segment_slope(n - 2),
                xq,
            ),
            QueryLocation::Inside(i) => {
                let w = (xq - self.x[i]) / (self.x[i + 1] - self.x[i]);
                Ok((1.0 - w) * self.y[i] + w * self.y[i + 1])
            }
        }
    }

    fn x(&self) -> &[f64] {
        &self.x
    }

    fn y(&self) -> &[f64] {
        &self.y
    }
}

fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 1 {
        return vec![0.0];
    }
    if n == 2 {
        let m = (y[1] - y[0]) / (x[1] - x[0]);
        return vec![m, m];
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let mut d = vec![0.0; n];
    for k in 1..(n - 1) {
        if delta[k - 1] * delta[k] > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// Three-point end slope, limited so the end segment stays monotone.
fn end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

#[inline]
fn hermite_eval(x0: f64, x1: f64, y0: f64, y1: f64, m0: f64, m1: f64, xq: f64) -> f64 {
    let h = x1 - x0;
    let s = (xq - x0) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
}

/// Shape-preserving cubic Hermite interpolation (PCHIP style).
#[derive(Debug, Clone)]
pub struct HermiteMonotoneInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
    extrapolation: ExtrapolationMode,
}

impl HermiteMonotoneInterpolator {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        extrapolation: ExtrapolationMode,
    ) -> Result<Self, InterpolationError> {
        validate_xy(&x, &y)?;
        let slopes = pchip_slopes(&x, &y);
        Ok(Self {
            x,
            y,
            slopes,
            extrapolation,
        })
    }
}

impl Interpolator for HermiteMonotoneInterpolator {
    fn value(&self, xq: f64) -> Result<f64, InterpolationError> {
        let n = self.x.len();
        match query_location(&self.x, xq) {
            QueryLocation::Single => single_node_value(self.extrapolation, self.x[0], self.y[0], xq),
            QueryLocation::Left => {
                extrapolate(self.extrapolation, self.x[0], self.y[0], self.slopes[0], xq)
            }
            QueryLocation::Right => extrapolate(
                self.extrapolation,
                self.x[n - 1],
                self.y[n - 1],
                self.slopes[n - 1],
                xq,
            ),
            QueryLocation::Inside(i) => Ok(hermite_eval(
                self.x[i],
                self.x[i + 1],
                self.y[i],
                self.y[i + 1],
                self.slopes[i],
                self.slopes[i + 1],
                xq,
            )),
        }
    }

    fn x(&self) -> &[f64] {
        &self.x
    }

    fn y(&self) -> &[f64] {
        &self.y
    }
}

/// Factory for [`LinearInterpolator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolatorFactory {
    pub extrapolation: ExtrapolationMode,
}

impl InterpolatorFactory for LinearInterpolatorFactory {
    fn create(
        &self,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Box<dyn Interpolator>, InterpolationError> {
        Ok(Box::new(LinearInterpolator::new(x, y, self.extrapolation)?))
    }
}

/// Factory for [`HermiteMonotoneInterpolator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HermiteMonotoneInterpolatorFactory {
    pub extrapolation: ExtrapolationMode,
}

impl InterpolatorFactory for HermiteMonotoneInterpolatorFactory {
    fn create(
        &self,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Box<dyn Interpolator>, InterpolationError> {
        Ok(Box::new(HermiteMonotoneInterpolator::new(
            x,
            y,
            self.extrapolation,
        )?))
    }
}
