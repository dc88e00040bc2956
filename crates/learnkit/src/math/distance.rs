use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::{Array1, Array2};

/// Minkowski norm order used by [`distance`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Norm {
    Manhattan,
    Euclidean,
    Minkowski(f64),
}

impl Norm {
    /// Build a norm from its order `p`; `p` must be a positive finite number.
    pub fn from_order(p: f64) -> Result<Self> {
        if !(p.is_finite() && p > 0.0) {
            return Err(LearnError::UnknownNorm(p.to_string()));
        }
        Ok(if p == 1.0 {
            Norm::Manhattan
        } else if p == 2.0 {
            Norm::Euclidean
        } else {
            Norm::Minkowski(p)
        })
    }

    pub fn order(&self) -> f64 {
        match self {
            Norm::Manhattan => 1.0,
            Norm::Euclidean => 2.0,
            Norm::Minkowski(p) => *p,
        }
    }
}

impl Default for Norm {
    fn default() -> Self {
        Norm::Manhattan
    }
}

impl FromStr for Norm {
    type Err = LearnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "l1" | "manhattan" => Ok(Norm::Manhattan),
            "l2" | "euclidean" => Ok(Norm::Euclidean),
            other => match other.parse::<f64>() {
                Ok(p) => Norm::from_order(p),
                Err(_) => Err(LearnError::UnknownNorm(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Norm::Manhattan => write!(f, "l1"),
            Norm::Euclidean => write!(f, "l2"),
            Norm::Minkowski(p) => write!(f, "{}", p),
        }
    }
}

fn distance_slices(u: &[f64], v: &[f64], norm: Norm) -> f64 {
    let diffs = u.iter().zip(v).map(|(a, b)| (a - b).abs());
    match norm {
        Norm::Manhattan => diffs.sum(),
        Norm::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        Norm::Minkowski(p) => diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p),
    }
}

/// `(Σ|u_i - v_i|^p)^(1/p)`.
pub fn distance(u: &Array1<f64>, v: &Array1<f64>, norm: Norm) -> Result<f64> {
    if u.len() != v.len() {
        return Err(LearnError::mismatch(u.shape(), v.shape()));
    }
    Ok(distance_slices(u.as_slice(), v.as_slice(), norm))
}

/// Distance from every row of `x` to `v`.
pub fn pairwise_distances(x: &Array2<f64>, v: &[f64], norm: Norm) -> Result<Array1<f64>> {
    if x.ncols() != v.len() {
        return Err(LearnError::mismatch(x.shape(), (v.len(),)));
    }
    Ok(x.rows().map(|row| distance_slices(row, v, norm)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_and_euclidean() {
        let u = Array1::from_vec(vec![0.0, 0.0]);
        let v = Array1::from_vec(vec![3.0, -4.0]);
        assert_eq!(distance(&u, &v, Norm::Manhattan).unwrap(), 7.0);
        assert_eq!(distance(&u, &v, Norm::Euclidean).unwrap(), 5.0);
    }

    #[test]
    fn general_order_matches_definition() {
        let u = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let v = Array1::from_vec(vec![2.0, 0.0, 3.0]);
        let expected = (1.0f64 + 8.0).powf(1.0 / 3.0);
        let d = distance(&u, &v, Norm::from_order(3.0).unwrap()).unwrap();
        assert!((d - expected).abs() < 1e-12);
    }

    #[test]
    fn parses_known_names_and_orders() {
        assert_eq!("l1".parse::<Norm>().unwrap(), Norm::Manhattan);
        assert_eq!("L2".parse::<Norm>().unwrap(), Norm::Euclidean);
        assert_eq!("2".parse::<Norm>().unwrap(), Norm::Euclidean);
        assert_eq!("3".parse::<Norm>().unwrap(), Norm::Minkowski(3.0));
    }

    #[test]
    fn unknown_norm_is_rejected() {
        assert!(matches!(
            "the_ultimate_norm".parse::<Norm>(),
            Err(LearnError::UnknownNorm(_))
        ));
        assert!(matches!("-1".parse::<Norm>(), Err(LearnError::UnknownNorm(_))));
    }

    #[test]
    fn pairwise_rows() {
        let x = Array2::from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let d = pairwise_distances(&x, &[1.0, 0.0], Norm::Manhattan).unwrap();
        assert_eq!(d.to_vec(), vec![1.0, 1.0]);
    }
}
