//! Next-month projections from a least-squares line through the monthly totals.

use crate::analytics::aggregate::Buckets;
use crate::model::Amount;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// The growth applied to the last known total when there is too little history to fit a line.
const FALLBACK_GROWTH: Decimal = Decimal::from_parts(105, 0, 0, false, 2);

/// One observed period: its position in the series and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: Decimal,
}

impl Point {
    pub fn new(x: i64, y: impl Into<Decimal>) -> Self {
        Self { x, y: y.into() }
    }
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regression {
    pub slope: Decimal,
    pub intercept: Decimal,
}

impl Regression {
    /// Ordinary least squares over `points`. Returns `None` for fewer than two points, or when
    /// the sums overflow. When every x is the same the slope is zero and the line sits at the
    /// mean of y.
    pub fn fit(points: &[Point]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = Decimal::from(points.len());
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) =
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        for p in points {
            let x = Decimal::from(p.x);
            sum_x = sum_x.checked_add(x)?;
            sum_y = sum_y.checked_add(p.y)?;
            sum_xy = sum_xy.checked_add(x.checked_mul(p.y)?)?;
            sum_xx = sum_xx.checked_add(x.checked_mul(x)?)?;
        }

        let denominator = n
            .checked_mul(sum_xx)?
            .checked_sub(sum_x.checked_mul(sum_x)?)?;
        let slope = if denominator.is_zero() {
            Decimal::ZERO
        } else {
            n.checked_mul(sum_xy)?
                .checked_sub(sum_x.checked_mul(sum_y)?)?
                .checked_div(denominator)?
        };
        let intercept = sum_y.checked_sub(slope.checked_mul(sum_x)?)?.checked_div(n)?;
        Some(Self { slope, intercept })
    }

    /// The line at `x`, saturating at the bounds of `Decimal`.
    pub fn at(&self, x: i64) -> Decimal {
        self.slope
            .saturating_mul(Decimal::from(x))
            .saturating_add(self.intercept)
    }
}

/// Turns month buckets into a series, months in chronological order, indexed from zero. Only
/// months that have records appear.
pub fn series(months: &Buckets, value: impl Fn(usize, Amount) -> Decimal) -> Vec<Point> {
    months
        .sorted_by_key()
        .into_iter()
        .enumerate()
        .map(|(ix, (_, bucket))| Point::new(ix as i64, value(bucket.count, bucket.sum)))
        .collect()
}

/// Next period's income. With fewer than two periods, or totals too large to fit a line, this is
/// the last known total plus five percent. Not clamped: a falling trend can project below zero.
pub fn forecast_income(points: &[Point]) -> Amount {
    let projected = match Regression::fit(points) {
        Some(line) => line.at(points.len() as i64),
        None => points
            .last()
            .map_or(Decimal::ZERO, |p| p.y)
            .saturating_mul(FALLBACK_GROWTH),
    };
    Amount::new(projected).round()
}

/// Next period's booking count, never below zero. With fewer than two periods this is the
/// number of bookings per observed month.
pub fn predict_bookings(points: &[Point], bookings: usize) -> u64 {
    let projected = match Regression::fit(points) {
        Some(line) => line.at(points.len() as i64),
        None => Decimal::from(bookings) / Decimal::from(points.len().max(1)),
    };
    projected
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO)
        .to_u64()
        .unwrap_or_default()
}
