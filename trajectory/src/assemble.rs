use std::path::Path;
use dsv::SampleSequence;
use headfile::Headfile;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::error::{TrajectoryError, TrajectoryResult};

const TIME_STEP_TOLERANCE:f64 = 1E-9;

/// Orientation of the trajectory axes relative to the gradient axes of the simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisConvention {
    /// kx, ky, kz follow gx, gy, gz
    #[default]
    Simulation,
    /// scanner frame: kx = -ky_sim, ky = -kx_sim, kz = kz_sim
    Scanner,
}

impl AxisConvention {
    pub fn apply(&self,k:[f64;3]) -> [f64;3] {
        match self {
            AxisConvention::Simulation => k,
            AxisConvention::Scanner => [-k[1],-k[0],k[2]],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyOptions {
    /// time step override, in the time unit of the sequences
    pub dt:Option<f64>,
    /// normalization factor applied to every point
    pub unit:f64,
    pub axes:AxisConvention,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            dt:None,
            unit:1.0,
            axes:AxisConvention::Simulation,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    points:Vec<[f64;3]>,
    time_step:f64,
    unit:f64,
    meta:Headfile,
}

impl Trajectory {
    pub fn points(&self) -> &[[f64;3]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }

    pub fn meta(&self) -> &Headfile {
        &self.meta
    }

    /// 3 x n array, one column per time step
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((3,self.points.len()),|(axis,i)| self.points[i][axis])
    }

    pub fn write_cfl(&self,cfl_base:&Path) -> TrajectoryResult<()> {
        mr_data::cfl::write_cfl_real(&self.to_array(),cfl_base)?;
        Ok(())
    }

    pub fn write_txt(&self,file_path:&Path) -> TrajectoryResult<()> {
        mr_data::txt::write_points_txt(&self.points,file_path)?;
        Ok(())
    }
}

/// check that the three axes share length and time base, returning the common time step
pub fn check_axes(gx:&SampleSequence,gy:&SampleSequence,gz:&SampleSequence) -> TrajectoryResult<f64> {
    if gx.len() != gy.len() || gx.len() != gz.len() {
        return Err(TrajectoryError::Mismatch(format!("gradient lengths differ: x {}, y {}, z {}",gx.len(),gy.len(),gz.len())));
    }
    let dt = gx.time_step();
    for (name,g) in [("y",gy),("z",gz)] {
        if g.time_unit() != gx.time_unit() {
            return Err(TrajectoryError::Mismatch(format!("time unit of {} is {} but x uses {}",name,g.time_unit().name(),gx.time_unit().name())));
        }
        let scale = dt.abs().max(g.time_step().abs());
        if (g.time_step() - dt).abs() > TIME_STEP_TOLERANCE*scale {
            return Err(TrajectoryError::Mismatch(format!("time step of {} is {} but x uses {}",name,g.time_step(),dt)));
        }
    }
    Ok(dt)
}

/// k[i] = unit * dt * sum(g[0..=i]) for every axis
pub fn assemble(gx:&SampleSequence,gy:&SampleSequence,gz:&SampleSequence,meta:&Headfile,opts:&AssemblyOptions) -> TrajectoryResult<Trajectory> {
    let native_dt = check_axes(gx,gy,gz)?;
    let dt = opts.dt.unwrap_or(native_dt);
    if !dt.is_finite() || dt <= 0.0 {
        return Err(TrajectoryError::Value(format!("time step must be positive, got {}",dt)));
    }
    if !opts.unit.is_finite() {
        return Err(TrajectoryError::Value(format!("unit must be finite, got {}",opts.unit)));
    }
    debug!("integrating {} samples with dt {} and unit {}",gx.len(),dt,opts.unit);

    let scale = dt*opts.unit;
    let kx = utils::cumsum(gx.samples());
    let ky = utils::cumsum(gy.samples());
    let kz = utils::cumsum(gz.samples());
    let points:Vec<[f64;3]> = kx.iter().zip(ky.iter()).zip(kz.iter())
        .map(|((x,y),z)| opts.axes.apply([scale*x,scale*y,scale*z]))
        .collect();

    let mut meta = meta.clone();
    meta.insert("dt",dt);
    meta.insert("dt_unit",gx.time_unit().name());
    meta.insert("unit",opts.unit);
    meta.insert("samples",points.len());
    if opts.axes == AxisConvention::Scanner {
        meta.insert("axes","scanner");
    }

    info!("assembled trajectory of {} points",points.len());
    Ok(Trajectory {
        points,
        time_step:dt,
        unit:opts.unit,
        meta,
    })
}

#[cfg(test)]
mod tests {
use super::*;
use dsv::TimeUnit;
use headfile::Value;

fn seq(samples:Vec<f64>,dt:f64) -> SampleSequence {
    SampleSequence::new(samples,dt,TimeUnit::Microseconds)
}

#[test]
fn fifty_samples() {
    let x:Vec<f64> = (0..50).map(|i| i as f64*0.1).collect();
    let y:Vec<f64> = (0..50).map(|i| -(i as f64)).collect();
    let z = vec![0.5;50];
    let f = 0.0109;
    let opts = AssemblyOptions{ unit:f, ..Default::default() };
    let t = assemble(&seq(x.clone(),10.0),&seq(y.clone(),10.0),&seq(z.clone(),10.0),&Headfile::new(),&opts).unwrap();
    assert_eq!(t.len(),50);
    let (mut sx,mut sy,mut sz) = (0.0,0.0,0.0);
    for i in 0..50 {
        sx += x[i];
        sy += y[i];
        sz += z[i];
        let p = t.points()[i];
        assert!((p[0] - f*sx*10.0).abs() < 1E-12);
        assert!((p[1] - f*sy*10.0).abs() < 1E-12);
        assert!((p[2] - f*sz*10.0).abs() < 1E-12);
    }
    assert_eq!(t.meta().get("samples"),Some(&Value::Int(50)));
    assert_eq!(t.meta().get("dt"),Some(&Value::Float(10.0)));
}

#[test]
fn length_mismatch() {
    let r = assemble(&seq(vec![0.0;50],10.0),&seq(vec![0.0;49],10.0),&seq(vec![0.0;50],10.0),&Headfile::new(),&AssemblyOptions::default());
    assert!(matches!(r,Err(TrajectoryError::Mismatch(_))));
}

#[test]
fn time_step_mismatch() {
    let r = assemble(&seq(vec![0.0;5],10.0),&seq(vec![0.0;5],10.0),&seq(vec![0.0;5],20.0),&Headfile::new(),&AssemblyOptions::default());
    assert!(matches!(r,Err(TrajectoryError::Mismatch(_))));
    let ms = SampleSequence::new(vec![0.0;5],10.0,TimeUnit::Milliseconds);
    let r = assemble(&seq(vec![0.0;5],10.0),&ms,&seq(vec![0.0;5],10.0),&Headfile::new(),&AssemblyOptions::default());
    assert!(matches!(r,Err(TrajectoryError::Mismatch(_))));
}

#[test]
fn dt_override_and_scanner_axes() {
    let g = seq(vec![1.0,1.0],10.0);
    let opts = AssemblyOptions{ dt:Some(2.0), unit:1.0, axes:AxisConvention::Scanner };
    let t = assemble(&seq(vec![1.0,2.0],10.0),&g,&g,&Headfile::new(),&opts).unwrap();
    assert_eq!(t.points(),&[[-2.0,-2.0,2.0],[-4.0,-6.0,4.0]]);
    assert_eq!(t.time_step(),2.0);
}

#[test]
fn bad_override_is_value_error() {
    let g = seq(vec![1.0],10.0);
    let opts = AssemblyOptions{ dt:Some(0.0), ..Default::default() };
    assert!(matches!(assemble(&g,&g,&g,&Headfile::new(),&opts),Err(TrajectoryError::Value(_))));
}

#[test]
fn metadata_is_kept() {
    let g = seq(vec![1.0],10.0);
    let mut meta = Headfile::new();
    meta.insert("TR",2000i64);
    let t = assemble(&g,&g,&g,&meta,&AssemblyOptions::default()).unwrap();
    assert_eq!(t.meta().get("TR"),Some(&Value::Int(2000)));
    assert_eq!(t.meta().keys().next(),Some("TR"));
}

#[test]
fn array_is_three_by_n() {
    let g = seq(vec![1.0,2.0,3.0],1.0);
    let t = assemble(&g,&g,&g,&Headfile::new(),&AssemblyOptions::default()).unwrap();
    let a = t.to_array();
    assert_eq!(a.shape(),&[3,3]);
    assert_eq!(a[[0,2]],6.0);
}

}
