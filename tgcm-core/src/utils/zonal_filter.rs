//! Zonal Fourier filtering
//!
//! Each latitude row of a field is decomposed into zonal wavenumbers and the
//! wavenumbers above a latitude dependent cutoff are removed,
//!
//! $$ m_{max}(\phi) = \lfloor f \, \tfrac{n_{lon}}{2} \cos\phi \rfloor $$
//!
//! where $f$ is the retained fraction. The shortest zonal wave that survives
//! therefore has roughly the same physical length at every latitude, which
//! keeps explicit time steps stable where the meridians converge. The zonal
//! mean of every row is preserved exactly.

use crate::grid::Grid;
use ndarray::{s, Array2, Array3};
use std::f64::consts::PI;
use std::ops::Range;

/// Low-pass filter in longitude with a cutoff shrinking toward the poles.
#[derive(Debug, Clone)]
pub struct ZonalFilter {
    nlon: usize,
    nyquist: usize,
    /// Highest retained wavenumber of each row
    cutoffs: Vec<usize>,
    cos_table: Array2<f64>,
    sin_table: Array2<f64>,
}

impl ZonalFilter {
    /// Build the filter for `grid`, keeping `fraction` of the wavenumbers
    /// resolvable at the equator.
    pub fn new(grid: &Grid, fraction: f64) -> Self {
        let nlon = grid.nlon();
        let nyquist = nlon / 2;
        let cutoffs = grid
            .cos_latitudes()
            .iter()
            .map(|c| {
                let cutoff = (fraction * nyquist as f64 * c.abs()).floor();
                (cutoff.max(0.0) as usize).min(nyquist)
            })
            .collect();
        let angle = |(m, j): (usize, usize)| 2.0 * PI * ((m * j) % nlon) as f64 / nlon as f64;
        Self {
            nlon,
            nyquist,
            cutoffs,
            cos_table: Array2::from_shape_fn((nyquist + 1, nlon), |mj| angle(mj).cos()),
            sin_table: Array2::from_shape_fn((nyquist + 1, nlon), |mj| angle(mj).sin()),
        }
    }

    /// Highest zonal wavenumber kept in `row`.
    pub fn cutoff(&self, row: usize) -> usize {
        self.cutoffs[row]
    }

    /// Filter every row of `field` on the given levels.
    ///
    /// Rows whose cutoff reaches the Nyquist wavenumber and lanes that are
    /// zonally uniform are left untouched.
    pub fn apply(&self, field: &mut Array3<f64>, levels: Range<usize>) {
        let (nlat, nlon, nlevels) = field.dim();
        assert_eq!(
            (nlat, nlon),
            (self.cutoffs.len(), self.nlon),
            "field does not match the filter grid"
        );
        let levels = levels.start.min(nlevels)..levels.end.min(nlevels);
        let mut buffer = vec![0.0; nlon];
        for (i, &cutoff) in self.cutoffs.iter().enumerate() {
            if cutoff >= self.nyquist {
                continue;
            }
            for k in levels.clone() {
                let mut lane = field.slice_mut(s![i, .., k]);
                buffer
                    .iter_mut()
                    .zip(lane.iter())
                    .for_each(|(b, value)| *b = *value);
                if self.filter_lane(&mut buffer, cutoff) {
                    lane.iter_mut()
                        .zip(buffer.iter())
                        .for_each(|(value, b)| *value = *b);
                }
            }
        }
    }

    /// Remove the wavenumbers above `cutoff` from a single row.
    ///
    /// Returns `false` without touching `lane` when it is zonally uniform.
    pub fn filter_lane(&self, lane: &mut [f64], cutoff: usize) -> bool {
        let n = self.nlon;
        assert_eq!(lane.len(), n, "lane does not match the filter grid");
        let (min, max) = lane
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(*x), hi.max(*x))
            });
        if min == max || cutoff >= self.nyquist {
            return false;
        }

        let mean = lane.iter().sum::<f64>() / n as f64;
        let anomaly: Vec<f64> = lane.iter().map(|x| x - mean).collect();
        let coefficients = |m: usize| {
            let weight = (if 2 * m == n { 1.0 } else { 2.0 }) / n as f64;
            let cos_row = self.cos_table.row(m);
            let sin_row = self.sin_table.row(m);
            let a = weight * anomaly.iter().zip(cos_row.iter()).map(|(x, c)| x * c).sum::<f64>();
            let b = if 2 * m == n {
                0.0
            } else {
                weight * anomaly.iter().zip(sin_row.iter()).map(|(x, s)| x * s).sum::<f64>()
            };
            (a, b)
        };

        // Work with whichever of the kept and removed wavenumbers is fewer
        let removed = self.nyquist - cutoff;
        if removed <= cutoff {
            for m in cutoff + 1..=self.nyquist {
                let (a, b) = coefficients(m);
                for (j, value) in lane.iter_mut().enumerate() {
                    *value -= a * self.cos_table[[m, j]] + b * self.sin_table[[m, j]];
                }
            }
        } else {
            lane.iter_mut().for_each(|value| *value = mean);
            for m in 1..=cutoff {
                let (a, b) = coefficients(m);
                for (j, value) in lane.iter_mut().enumerate() {
                    *value += a * self.cos_table[[m, j]] + b * self.sin_table[[m, j]];
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{GridParameters, PlanetParameters};
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(&GridParameters::default(), &PlanetParameters::default()).unwrap()
    }

    fn wave(nlon: usize, m: usize, phase: f64) -> Vec<f64> {
        (0..nlon)
            .map(|j| (2.0 * PI * (m * j) as f64 / nlon as f64 + phase).cos())
            .collect()
    }

    #[test]
    fn test_cutoff_shrinks_toward_the_poles() {
        let grid = grid();
        let filter = ZonalFilter::new(&grid, 1.0);
        let nlat = grid.nlat();
        assert_eq!(filter.cutoff(nlat / 2), 35);
        assert_eq!(filter.cutoff(0), filter.cutoff(nlat - 1));
        assert_eq!(filter.cutoff(nlat - 1), 1);
        for i in nlat / 2..nlat - 1 {
            assert!(filter.cutoff(i + 1) <= filter.cutoff(i));
        }

        let half = ZonalFilter::new(&grid, 0.5);
        assert_eq!(half.cutoff(nlat / 2), 17);
    }

    #[test]
    fn test_keeps_long_waves_and_removes_short_ones() {
        let filter = ZonalFilter::new(&grid(), 1.0);
        let long = wave(72, 3, 0.4);
        let short = wave(72, 20, 1.3);
        let mut lane: Vec<f64> = long
            .iter()
            .zip(short.iter())
            .map(|(a, b)| 250.0 + 2.0 * a + b)
            .collect();

        // Cutoffs on either side of the midpoint take different paths
        for cutoff in [10, 25] {
            let mut filtered = lane.clone();
            assert!(filter.filter_lane(&mut filtered, cutoff));
            for (j, value) in filtered.iter().enumerate() {
                let expected = if cutoff >= 20 {
                    lane[j]
                } else {
                    250.0 + 2.0 * long[j]
                };
                assert_relative_eq!(*value, expected, epsilon = 1e-10);
            }
        }

        // The Nyquist wave is removed by any cutoff below it
        lane = (0..72).map(|j| if j % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(filter.filter_lane(&mut lane, 35));
        assert!(lane.iter().all(|x| x.abs() < 1e-12));
    }

    #[test]
    fn test_preserves_row_means() {
        let grid = grid();
        let filter = ZonalFilter::new(&grid, 0.3);
        let mut field = Array3::from_shape_fn(grid.shape_3d(), |(i, j, k)| {
            280.0 + (i as f64 * 0.7 + j as f64 * 1.9).sin() * (k as f64 + 1.0)
        });
        let before = field.clone();
        filter.apply(&mut field, 0..grid.nlevels());
        assert!(field != before);
        for i in 0..grid.nlat() {
            for k in 0..grid.nlevels() {
                assert_relative_eq!(
                    field.slice(s![i, .., k]).sum(),
                    before.slice(s![i, .., k]).sum(),
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_uniform_rows_and_other_levels_untouched() {
        let grid = grid();
        let filter = ZonalFilter::new(&grid, 0.5);
        let mut field = Array3::from_shape_fn(grid.shape_3d(), |(i, _, k)| {
            287.3 + 0.1 * i as f64 + 3.0 * k as f64
        });
        for j in 0..grid.nlon() {
            field[[40, j, 16]] += (j as f64).sin();
        }
        let before = field.clone();
        filter.apply(&mut field, 0..15);
        assert_eq!(field, before);

        filter.apply(&mut field, 0..grid.nlevels());
        assert!(field.slice(s![40, .., 16]) != before.slice(s![40, .., 16]));
        assert_eq!(field.slice(s![.., .., ..16]), before.slice(s![.., .., ..16]));
    }
}
