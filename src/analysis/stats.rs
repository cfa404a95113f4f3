use anyhow::{bail, Result};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;
use std::str::FromStr;

/// Upper bound on Freedman-Diaconis bins; a far outlier falls back to this many equal bins
pub const MAX_BINS: usize = 500;

/// How histogram bins are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinRule {
    /// Freedman-Diaconis width from the interquartile range
    Freedman,
    Fixed(usize),
}

impl FromStr for BinRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("freedman") {
            return Ok(BinRule::Freedman);
        }
        match s.parse::<usize>() {
            Ok(0) => bail!("Bin count must be positive"),
            Ok(n) => Ok(BinRule::Fixed(n)),
            Err(_) => bail!("Unknown bin rule: {}", s),
        }
    }
}

/// Linear-interpolated quantile of sorted data, `q` in [0, 1]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Density-normalized histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn build(values: &[f64], rule: BinRule) -> Option<Self> {
        match rule {
            BinRule::Freedman => Self::freedman(values),
            BinRule::Fixed(n) => Self::with_bins(values, n),
        }
    }

    /// Bin width `2 * IQR / n^(1/3)`; a single bin when the IQR is zero,
    /// [`MAX_BINS`] equal bins when the width would need more than that
    pub fn freedman(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values)?;
        let n = sorted.len() as f64;
        let iqr = quantile(&sorted, 0.75)? - quantile(&sorted, 0.25)?;
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

        let width = 2.0 * iqr / n.cbrt();
        if width <= 0.0 || !width.is_finite() {
            return Self::with_bins(&sorted, 1);
        }

        let span = ((max - min) / width).ceil();
        if !span.is_finite() || span > MAX_BINS as f64 {
            return Self::with_bins(&sorted, MAX_BINS);
        }

        let bins = (span as usize).max(1);
        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        Some(Self::fill(edges, &sorted))
    }

    /// `bins` equal-width bins spanning the data
    pub fn with_bins(values: &[f64], bins: usize) -> Option<Self> {
        let sorted = sorted(values)?;
        let bins = bins.max(1);
        let (mut min, mut max) = (sorted[0], sorted[sorted.len() - 1]);
        if min == max {
            min -= 0.5;
            max += 0.5;
        }
        let width = (max - min) / bins as f64;
        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        Some(Self::fill(edges, &sorted))
    }

    fn fill(edges: Vec<f64>, sorted: &[f64]) -> Self {
        let bins = edges.len() - 1;
        let mut counts = vec![0; bins];
        for v in sorted {
            // Right edge of the last bin is inclusive
            let idx = edges[1..].iter().position(|e| v < e).unwrap_or(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Per-bin density so the histogram integrates to one
    pub fn density(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(c, e)| {
                let width = e[1] - e[0];
                if total == 0.0 || width <= 0.0 {
                    0.0
                } else {
                    *c as f64 / (total * width)
                }
            })
            .collect()
    }

    /// Outline of a step histogram, as (x, density) points
    pub fn step_points(&self) -> Vec<(f64, f64)> {
        let density = self.density();
        let mut points = Vec::with_capacity(density.len() * 2 + 2);
        points.push((self.edges[0], 0.0));
        for (d, e) in density.iter().zip(self.edges.windows(2)) {
            points.push((e[0], *d));
            points.push((e[1], *d));
        }
        points.push((self.edges[self.edges.len() - 1], 0.0));
        points
    }
}

/// Maximum-likelihood normal fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalFit {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl NormalFit {
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: values.iter().mean(),
            std: values.iter().population_std_dev(),
        })
    }

    /// `None` for a zero-width fit
    pub fn distribution(&self) -> Option<Normal> {
        Normal::new(self.mean, self.std).ok()
    }

    /// Density at `x`; zero everywhere for a degenerate fit
    pub fn pdf(&self, x: f64) -> f64 {
        self.distribution().map_or(0.0, |dist| dist.pdf(x))
    }

    /// `points` evenly spaced samples of the pdf over [lo, hi]
    pub fn curve(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        let dist = self.distribution();
        let pdf = |x: f64| dist.map_or(0.0, |d| d.pdf(x));
        match points {
            0 => Vec::new(),
            1 => vec![(lo, pdf(lo))],
            _ => {
                let step = (hi - lo) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = lo + step * i as f64;
                        (x, pdf(x))
                    })
                    .collect()
            }
        }
    }
}

fn sorted(values: &[f64]) -> Option<Vec<f64>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&v, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&v, 0.75).unwrap(), 3.25));
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn test_freedman_bins() {
        let v: Vec<f64> = (1..=8).map(f64::from).collect();
        // IQR 3.5, width 2 * 3.5 / 2 = 3.5, range 7 -> 2 bins
        let h = Histogram::freedman(&v).unwrap();
        assert_eq!(h.counts.len(), 2);
        assert_eq!(h.total(), 8);
        assert_eq!(h.counts, vec![4, 4]);
    }

    #[test]
    fn test_zero_iqr_falls_back_to_one_bin() {
        let h = Histogram::freedman(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(h.counts, vec![3]);
        assert!(close(h.density()[0], 1.0));
    }

    #[test]
    fn test_far_outlier_caps_bin_count() {
        let mut v: Vec<f64> = (0..99).map(|i| i as f64 * 1e-6).collect();
        v.push(1e9);
        let h = Histogram::freedman(&v).unwrap();
        assert_eq!(h.counts.len(), MAX_BINS);
        assert_eq!(h.total(), 100);
        assert_eq!(h.counts[0], 99);
        assert_eq!(h.counts[MAX_BINS - 1], 1);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let v = [150.0, 160.0, 165.0, 170.0, 172.0, 180.0, 183.0, 196.0];
        let h = Histogram::with_bins(&v, 4).unwrap();
        let area: f64 = h
            .density()
            .iter()
            .zip(h.edges.windows(2))
            .map(|(d, e)| d * (e[1] - e[0]))
            .sum();
        assert!(close(area, 1.0));
        assert_eq!(h.step_points().len(), 10);
    }

    #[test]
    fn test_normal_fit() {
        let fit = NormalFit::fit(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(fit.mean, 5.0));
        assert!(close(fit.std, 2.0));
        assert!(close(fit.pdf(5.0), 1.0 / (2.0 * (2.0 * PI).sqrt())));
        assert_eq!(fit.curve(0.0, 10.0, 100).len(), 100);

        let flat = NormalFit::fit(&[3.0, 3.0]).unwrap();
        assert!(flat.distribution().is_none());
        assert_eq!(flat.pdf(3.0), 0.0);
    }

    #[test]
    fn test_bin_rule_parse() {
        assert_eq!("freedman".parse::<BinRule>().unwrap(), BinRule::Freedman);
        assert_eq!("12".parse::<BinRule>().unwrap(), BinRule::Fixed(12));
        assert!("0".parse::<BinRule>().is_err());
        assert!("scott".parse::<BinRule>().is_err());
    }
}
