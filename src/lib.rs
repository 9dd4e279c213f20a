//! Reconstruction half of Shamir's Secret Sharing over the integers.
//!
//! Each share is a point `(x, y)` on a polynomial of degree `k - 1` with integer
//! coefficients, and the secret is the polynomial's constant term. Any `k` shares
//! recover it through Lagrange interpolation at `x = 0`, computed here with
//! arbitrary-precision integers only, so secrets of any size come back exactly.
use num_bigint::BigInt;
use num_traits::identities::{One, Zero};
use thiserror::Error;

pub mod decode;
pub mod extensions;
pub mod source;

pub use decode::{decode_points, encode_value, ShareRecord};
pub use source::{
    reconstruct_from_source, FileSource, MemorySource, ReconstructOptions, ShareSet, ShareSource,
    Thresholds,
};

/// These are errors that can occur while decoding shares or reconstructing a secret
#[derive(Error, Debug)]
pub enum SssError {
    #[error("share index {index:?} is not a base-10 integer")]
    MalformedIndex { index: String },

    #[error("share {index:?} declares base {base:?}, expected an integer in 2..=36")]
    InvalidBase { index: String, base: String },

    #[error("share {index:?} value is not a base-{base} number (bad digit at position {position})")]
    InvalidDigitString {
        index: String,
        base: u32,
        /// Character offset of the first offending digit
        position: usize,
    },

    /// Two shares decode to the same x-coordinate
    #[error("duplicate share index {x}")]
    DuplicateIndex { x: i64 },

    #[error("threshold k must be at least 1 (got k = {threshold}, n = {total_shares})")]
    InvalidThreshold {
        threshold: usize,
        total_shares: usize,
    },

    #[error("not enough points to reconstruct secret (need {threshold}, got {point_count})")]
    InsufficientPoints {
        /// Required number of points (k)
        threshold: usize,
        /// Actual number of points provided
        point_count: usize,
    },

    #[error("Lagrange denominator vanishes at x = {x}: share indices are not distinct")]
    DegenerateDenominator { x: i64 },

    #[error("points do not lie on an integer polynomial of degree below {threshold}")]
    InexactInterpolation { threshold: usize },

    #[error("{windows} windows of {threshold} shares disagree on the secret")]
    InconsistentShares { threshold: usize, windows: usize },

    #[error("declared {declared} shares but {supplied} were supplied")]
    ShareCountMismatch { declared: usize, supplied: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A single share, i.e. a point on the secret-encoding polynomial
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    /// The x-coordinate of the polynomial point (share index)
    pub x: i64,
    /// The y-coordinate of the polynomial point (share value)
    pub y: BigInt,
}

impl Point {
    /// Creates a point from a share index and any integer-like value
    pub fn new(x: i64, y: impl Into<BigInt>) -> Self {
        Point { x, y: y.into() }
    }
}

/// Result of interpolating a working point set at `x = 0`.
///
/// The secret is `S / D` for an integer numerator `S` and the common Lagrange
/// denominator `D`. When the points lie on an integer polynomial the division
/// leaves no remainder. Otherwise `secret` is the quotient truncated toward zero
/// and the result should not be trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconstruction {
    pub secret: BigInt,
    remainder: BigInt,
}

impl Reconstruction {
    /// True when the final division was exact
    pub fn is_exact(&self) -> bool {
        self.remainder.is_zero()
    }

    /// Remainder of the final `S / D` division, zero for consistent points
    pub fn remainder(&self) -> &BigInt {
        &self.remainder
    }
}

/// Threshold parameters plus the policy applied when reconstructing
#[derive(Clone, Debug)]
pub struct Scheme {
    /// Minimum number of shares needed to reconstruct (k)
    threshold: usize,
    /// Number of shares the input declares (n)
    total_shares: usize,
    strict: bool,
    verify: bool,
    enforce_share_count: bool,
}

impl Scheme {
    /// Creates a reconstruction scheme for a `(k, n)` sharing.
    ///
    /// # Arguments
    /// * `threshold` - Minimum number of shares needed to reconstruct the secret (k)
    /// * `total_shares` - Number of shares the input declares (n). Informational:
    ///                    a divergence from the supplied shares is only logged
    ///                    unless [`Scheme::with_share_count_enforced`] is set.
    ///
    /// # Returns
    /// * `Ok(Scheme)` - If `threshold > 0`
    /// * `Err(SssError::InvalidThreshold)` - If threshold is 0
    ///
    /// # Example
    /// ```
    /// use shamir_reconstruct::Scheme;
    ///
    /// let scheme = Scheme::new(3, 5).unwrap();
    /// assert_eq!(scheme.threshold(), 3);
    /// ```
    pub fn new(threshold: usize, total_shares: usize) -> Result<Self, SssError> {
        if threshold == 0 {
            return Err(SssError::InvalidThreshold {
                threshold,
                total_shares,
            });
        }

        Ok(Scheme {
            threshold,
            total_shares,
            strict: false,
            verify: false,
            enforce_share_count: false,
        })
    }

    /// Turns an inexact interpolation into `SssError::InexactInterpolation`
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Cross-checks every window of `k` shares when more than `k` are supplied
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Rejects point sets whose size differs from the declared `n`
    pub fn with_share_count_enforced(mut self, enforce: bool) -> Self {
        self.enforce_share_count = enforce;
        self
    }

    /// Minimum number of shares needed to reconstruct (k)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of shares the input declares (n)
    pub fn total_shares(&self) -> usize {
        self.total_shares
    }

    /// Reconstructs the secret from `k` or more points.
    ///
    /// The points are sorted by `x` and the first `k` form the active set, so the
    /// result does not depend on the order the points arrive in.
    ///
    /// # Returns
    /// * `Ok(Reconstruction)` - The reconstructed secret
    /// * `Err(SssError::InsufficientPoints)` - If fewer than k points provided
    /// * `Err(SssError::DuplicateIndex)` - If points contain duplicate x-coordinates
    /// * `Err(SssError::InexactInterpolation)` - In strict mode, if the points are inconsistent
    ///
    /// # Example
    /// ```
    /// # use num_bigint::BigInt;
    /// # use shamir_reconstruct::{Point, Scheme};
    /// let scheme = Scheme::new(2, 3).unwrap();
    /// // y = 7 + 2x
    /// let points = vec![Point::new(3, 13), Point::new(1, 9), Point::new(2, 11)];
    /// let reconstruction = scheme.reconstruct_secret(&points).unwrap();
    /// assert_eq!(reconstruction.secret, BigInt::from(7));
    /// ```
    pub fn reconstruct_secret(&self, points: &[Point]) -> Result<Reconstruction, SssError> {
        self.check_share_count(points.len())?;

        if points.len() > self.threshold {
            if self.verify {
                let report = extensions::consistency::verify_consistency(points, self.threshold)?;
                if !report.consistent {
                    return Err(SssError::InconsistentShares {
                        threshold: self.threshold,
                        windows: report.window_secrets.len(),
                    });
                }
            } else {
                log::debug!(
                    "using {} of {} shares; the rest are not checked",
                    self.threshold,
                    points.len()
                );
            }
        }

        let active = select_active_set(points, self.threshold)?;
        let reconstruction = interpolate_at_zero(&active, self.threshold)?;

        if !reconstruction.is_exact() {
            if self.strict {
                return Err(SssError::InexactInterpolation {
                    threshold: self.threshold,
                });
            }
            log::warn!(
                "shares do not lie on an integer polynomial of degree below {}; result is untrusted",
                self.threshold
            );
        }

        Ok(reconstruction)
    }

    fn check_share_count(&self, supplied: usize) -> Result<(), SssError> {
        if self.threshold > self.total_shares {
            log::warn!(
                "threshold {} exceeds the {} declared shares",
                self.threshold,
                self.total_shares
            );
        }
        if supplied == self.total_shares {
            return Ok(());
        }
        if self.enforce_share_count {
            return Err(SssError::ShareCountMismatch {
                declared: self.total_shares,
                supplied,
            });
        }
        log::warn!(
            "declared {} shares but {} were supplied",
            self.total_shares,
            supplied
        );
        Ok(())
    }
}

/// Sorts points ascending by `x` and rejects repeated x-coordinates
pub(crate) fn sort_points(mut points: Vec<Point>) -> Result<Vec<Point>, SssError> {
    points.sort_by_key(|point| point.x);
    if let Some(pair) = points.windows(2).find(|pair| pair[0].x == pair[1].x) {
        return Err(SssError::DuplicateIndex { x: pair[0].x });
    }
    Ok(points)
}

pub(crate) fn check_threshold(point_count: usize, threshold: usize) -> Result<(), SssError> {
    if threshold == 0 {
        return Err(SssError::InvalidThreshold {
            threshold,
            total_shares: point_count,
        });
    }
    if point_count < threshold {
        return Err(SssError::InsufficientPoints {
            threshold,
            point_count,
        });
    }
    Ok(())
}

/// Selects the working point set: the `threshold` points with the smallest `x`,
/// in ascending order.
pub fn select_active_set(points: &[Point], threshold: usize) -> Result<Vec<Point>, SssError> {
    check_threshold(points.len(), threshold)?;

    let mut active = sort_points(points.to_vec())?;
    active.truncate(threshold);

    log::debug!(
        "active set x = {:?}",
        active.iter().map(|point| point.x).collect::<Vec<_>>()
    );
    Ok(active)
}

/// Computes the Lagrange basis polynomial l_j(x) = ∏(m≠j) (x - x_m)/(x_j - x_m)
/// at x = 0, returned as an unreduced `(numerator, denominator)` pair.
pub fn lagrange_basis_at_zero(points: &[Point], j: usize) -> Result<(BigInt, BigInt), SssError> {
    let mut numerator = BigInt::one();
    let mut denominator = BigInt::one();
    let x_j = BigInt::from(points[j].x);

    for (m, point) in points.iter().enumerate() {
        if m != j {
            let x_m = BigInt::from(point.x);

            numerator *= -&x_m;
            denominator *= &x_j - &x_m;
        }
    }

    if denominator.is_zero() {
        return Err(SssError::DegenerateDenominator { x: points[j].x });
    }

    Ok((numerator, denominator))
}

/// Evaluates the interpolating polynomial of the first `threshold` points at
/// `x = 0`.
///
/// Every term `y_j * num_j / den_j` is brought over the common denominator
/// `D = ∏ den_j` and the sum is divided once. Integer division truncates toward
/// zero; a non-zero remainder is reported through [`Reconstruction::is_exact`].
///
/// # Example
/// ```
/// # use num_bigint::BigInt;
/// # use shamir_reconstruct::{interpolate_at_zero, Point};
/// let points = vec![Point::new(1, 3), Point::new(2, 6), Point::new(3, 9)];
/// let reconstruction = interpolate_at_zero(&points, 3).unwrap();
/// assert_eq!(reconstruction.secret, BigInt::from(0));
/// assert!(reconstruction.is_exact());
/// ```
pub fn interpolate_at_zero(points: &[Point], threshold: usize) -> Result<Reconstruction, SssError> {
    check_threshold(points.len(), threshold)?;
    let points = &points[..threshold];

    let bases = (0..points.len())
        .map(|j| lagrange_basis_at_zero(points, j))
        .collect::<Result<Vec<_>, _>>()?;

    let common_denominator: BigInt = bases.iter().map(|(_, den)| den).product();

    let mut numerator_sum = BigInt::zero();
    for (point, (num, den)) in points.iter().zip(&bases) {
        // common_denominator / den is the product of the other denominators
        numerator_sum += &point.y * num * (&common_denominator / den);
    }

    let secret = &numerator_sum / &common_denominator;
    let remainder = &numerator_sum % &common_denominator;

    Ok(Reconstruction { secret, remainder })
}
