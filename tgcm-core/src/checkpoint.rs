//! Checkpoints of the model state
//!
//! A checkpoint holds everything needed to resume an integration: the
//! prognostic fields, the plane velocities of both hemispheres and the elapsed
//! model time. Diagnostics (geopotential, the tendency buffer, plane vertical
//! velocity) are recomputed on the next step and are not stored.
//!
//! Checkpoints are encoded with `bincode`, which stores `f64` values bit for
//! bit, so a save/load round trip reproduces the state exactly.

use crate::errors::GcmResult;
use crate::grid::Grid;
use crate::polar::{PolarPlane, PolarPlanes};
use crate::state::{check_shape, ModelState};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Velocity components on one polar plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaneVelocity {
    pub x_dot: Array3<f64>,
    pub y_dot: Array3<f64>,
}

impl PlaneVelocity {
    fn capture(plane: &PolarPlane) -> Self {
        Self {
            x_dot: plane.x_dot.clone(),
            y_dot: plane.y_dot.clone(),
        }
    }

    fn check(&self, name: &str, plane: &PolarPlane) -> GcmResult<()> {
        let expected = plane.x_dot.dim();
        check_shape(&format!("{name}.x_dot"), self.x_dot.shape(), expected)?;
        check_shape(&format!("{name}.y_dot"), self.y_dot.shape(), expected)
    }
}

/// Snapshot of the model sufficient to resume an integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub potential_temperature: Array3<f64>,
    pub surface_temperature: Array2<f64>,
    pub u: Array3<f64>,
    pub v: Array3<f64>,
    pub w: Array3<f64>,
    pub north: PlaneVelocity,
    pub south: PlaneVelocity,
    /// Elapsed model time (s)
    pub time: f64,
    pub albedo: Array2<f64>,
    pub tracer: Array3<f64>,
}

impl Checkpoint {
    pub fn capture(state: &ModelState, planes: &PolarPlanes, time: f64) -> Self {
        Self {
            potential_temperature: state.potential_temperature.clone(),
            surface_temperature: state.surface_temperature.clone(),
            u: state.u.clone(),
            v: state.v.clone(),
            w: state.w.clone(),
            north: PlaneVelocity::capture(&planes.north),
            south: PlaneVelocity::capture(&planes.south),
            time,
            albedo: state.albedo.clone(),
            tracer: state.tracer.clone(),
        }
    }

    /// Write the checkpoint into `state` and `planes`, returning the elapsed time.
    ///
    /// Every field is checked against the grid before anything is modified.
    pub fn restore(
        self,
        grid: &Grid,
        state: &mut ModelState,
        planes: &mut PolarPlanes,
    ) -> GcmResult<f64> {
        for (name, field) in [
            ("potential_temperature", &self.potential_temperature),
            ("u", &self.u),
            ("v", &self.v),
            ("w", &self.w),
            ("tracer", &self.tracer),
        ] {
            check_shape(name, field.shape(), grid.shape_3d())?;
        }
        check_shape(
            "surface_temperature",
            self.surface_temperature.shape(),
            grid.shape_2d(),
        )?;
        check_shape("albedo", self.albedo.shape(), grid.shape_2d())?;
        self.north.check("north", &planes.north)?;
        self.south.check("south", &planes.south)?;

        state.potential_temperature = self.potential_temperature;
        state.surface_temperature = self.surface_temperature;
        state.u = self.u;
        state.v = self.v;
        state.w = self.w;
        state.albedo = self.albedo;
        state.tracer = self.tracer;
        planes.north.x_dot = self.north.x_dot;
        planes.north.y_dot = self.north.y_dot;
        planes.south.x_dot = self.south.x_dot;
        planes.south.y_dot = self.south.y_dot;
        Ok(self.time)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> GcmResult<()> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> GcmResult<Self> {
        Ok(bincode::deserialize_from(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> GcmResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> GcmResult<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GcmError;
    use crate::parameters::{GridParameters, PlanetParameters};

    fn setup() -> (Grid, PolarPlanes, ModelState) {
        let params = GridParameters {
            nlat: 24,
            nlon: 36,
            pole_lower_lat_limit: 70.0,
            pole_higher_lat_limit: 80.0,
            polar_grid_padding: 1,
            ..Default::default()
        };
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let planes = PolarPlanes::new(&grid, &params).unwrap();
        let mut state = ModelState::isothermal(&grid, 250.0, 288.0, 0.3).unwrap();
        state.u.indexed_iter_mut().for_each(|((i, j, k), value)| {
            *value = (i as f64 * 0.1).sin() + j as f64 / 7.0 - k as f64 * 1e-3
        });
        state.tracer[[3, 4, 5]] = 1.0 / 3.0;
        (grid, planes, state)
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let (_, mut planes, state) = setup();
        planes.north.x_dot.fill(0.1 + 0.2);
        planes.south.y_dot.fill(-std::f64::consts::E);
        let checkpoint = Checkpoint::capture(&state, &planes, 12345.678);

        let mut buffer = Vec::new();
        checkpoint.write_to(&mut buffer).unwrap();
        let restored = Checkpoint::read_from(buffer.as_slice()).unwrap();

        assert_eq!(restored, checkpoint);
        assert_eq!(restored.time.to_bits(), 12345.678f64.to_bits());
    }

    #[test]
    fn test_restore_writes_state_and_planes() {
        let (grid, mut planes, state) = setup();
        planes.south.x_dot.fill(4.0);
        let checkpoint = Checkpoint::capture(&state, &planes, 60.0);

        let mut fresh_planes = PolarPlanes::new(&grid, &GridParameters {
            nlat: 24,
            nlon: 36,
            pole_lower_lat_limit: 70.0,
            pole_higher_lat_limit: 80.0,
            polar_grid_padding: 1,
            ..Default::default()
        })
        .unwrap();
        let mut fresh = ModelState::isothermal(&grid, 200.0, 200.0, 0.5).unwrap();
        let time = checkpoint
            .restore(&grid, &mut fresh, &mut fresh_planes)
            .unwrap();

        assert_eq!(time, 60.0);
        assert_eq!(fresh.u, state.u);
        assert_eq!(fresh.tracer, state.tracer);
        assert_eq!(fresh.albedo, state.albedo);
        assert_eq!(fresh_planes.south.x_dot, planes.south.x_dot);
    }

    #[test]
    fn test_restore_rejects_wrong_shape() {
        let (grid, mut planes, mut state) = setup();
        let mut checkpoint = Checkpoint::capture(&state, &planes, 0.0);
        checkpoint.w = Array3::zeros((1, 2, 3));
        let result = checkpoint.restore(&grid, &mut state, &mut planes);
        assert!(matches!(
            result,
            Err(GcmError::ShapeMismatch { ref field, .. }) if field == "w"
        ));
    }

    #[test]
    fn test_save_and_load() {
        let (_, planes, state) = setup();
        let checkpoint = Checkpoint::capture(&state, &planes, 1800.0);
        let path = std::env::temp_dir().join(format!(
            "tgcm-checkpoint-unit-{}.bin",
            std::process::id()
        ));
        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Checkpoint::load("/nonexistent/tgcm/checkpoint.bin");
        assert!(matches!(result, Err(GcmError::Io(_))));
    }
}
