//! k-space sampled at the ADC sample times of the INF event blocks.
//!
//! Gradient samples describe the center of their raster interval, so gradient sample j ends up at
//! (j + gradient_shift) * dt after the k-space origin. ADC sample i sits at
//! (i + adc_shift) * duration / samples after the start of its readout.
//! The k-space origin of a block is the center of its RF pulse; RF refocusing is not modelled.

use std::path::Path;
use dsv::{Adc, EventBlock};
use headfile::Headfile;
use ndarray::Array3;
use tracing::{debug, info};
use crate::assemble::AxisConvention;
use crate::config::{ADC_SHIFT_DEFAULT, GRADIENT_SHIFT_DEFAULT};
use crate::error::{TrajectoryError, TrajectoryResult};

#[derive(Clone, Debug, PartialEq)]
pub struct AdcOptions {
    /// gradient raster time in the time unit of the INF file (µs)
    pub dt:i64,
    pub unit:f64,
    pub adc_shift:f64,
    pub gradient_shift:f64,
    pub axes:AxisConvention,
}

impl Default for AdcOptions {
    fn default() -> Self {
        Self {
            dt:1,
            unit:1.0,
            adc_shift:ADC_SHIFT_DEFAULT,
            gradient_shift:GRADIENT_SHIFT_DEFAULT,
            axes:AxisConvention::Scanner,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdcTrajectory {
    data:Array3<f64>,
    meta:Headfile,
}

impl AdcTrajectory {
    /// (3, samples per adc, adc count)
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn samples_per_adc(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn adc_count(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn meta(&self) -> &Headfile {
        &self.meta
    }

    /// points ordered by adc, then by sample
    pub fn points(&self) -> Vec<[f64;3]> {
        let mut points = Vec::with_capacity(self.samples_per_adc()*self.adc_count());
        for line in 0..self.adc_count() {
            for s in 0..self.samples_per_adc() {
                points.push([self.data[[0,s,line]],self.data[[1,s,line]],self.data[[2,s,line]]]);
            }
        }
        points
    }

    pub fn write_cfl(&self,cfl_base:&Path) -> TrajectoryResult<()> {
        mr_data::cfl::write_cfl_real(&self.data,cfl_base)?;
        Ok(())
    }

    pub fn write_txt(&self,file_path:&Path) -> TrajectoryResult<()> {
        mr_data::txt::write_points_txt(&self.points(),file_path)?;
        Ok(())
    }
}

/// index of time t on a raster of dt. Times off the raster are an error unless round_up is set.
pub fn index_of(t:i64,dt:i64,round_up:bool) -> TrajectoryResult<usize> {
    if t < 0 {
        return Err(TrajectoryError::Value(format!("negative time {}",t)));
    }
    let mut i = t / dt;
    if t % dt != 0 {
        match round_up {
            true => i += 1,
            false => return Err(TrajectoryError::Value(format!("t={} is not an integer multiple of dt={}",t,dt))),
        }
    }
    Ok(i as usize)
}

/// one block with readouts, as gradient sample indices
#[derive(Debug)]
struct Measurement<'a> {
    ksp_time:i64,
    ksp_start:usize,
    stop:usize,
    adcs:&'a [Adc],
}

impl Measurement<'_> {
    fn len(&self) -> usize {
        self.stop - self.ksp_start
    }
}

fn measurements(blocks:&[EventBlock],dt:i64,n_gradient:usize) -> TrajectoryResult<Vec<Measurement<'_>>> {
    let mut out = Vec::new();
    for block in blocks.iter().filter(|b| !b.adcs.is_empty()) {
        index_of(block.start,dt,false)?;
        let overflow = || TrajectoryError::Value(format!("times of the block at {} overflow 64 bits",block.start));
        let mut last = block.start;
        for adc in &block.adcs {
            last = last.max(adc.end().ok_or_else(overflow)?);
        }
        let stop = index_of(last,dt,true)?;
        let ksp_time = match &block.rf {
            Some(rf) => block.start.checked_add(rf.start)
                .and_then(|t| t.checked_add(rf.duration/2))
                .ok_or_else(overflow)?,
            None => block.start,
        };
        let ksp_start = index_of(ksp_time,dt,true)?;
        if stop > n_gradient {
            return Err(TrajectoryError::Mismatch(format!("block at {} reads up to gradient sample {} but the waveform has {}",block.start,stop,n_gradient)));
        }
        if stop < ksp_start {
            return Err(TrajectoryError::Format(format!("block at {} has readouts ending before the k-space origin at {}",block.start,ksp_time)));
        }
        debug!("block at {}: k-space origin {} ({}..{}), {} adcs",block.start,ksp_time,ksp_start,stop,block.adcs.len());
        out.push(Measurement{ ksp_time, ksp_start, stop, adcs:&block.adcs });
    }
    Ok(out)
}

/// common sample count of every adc
fn samples_per_adc(meas:&[Measurement]) -> TrajectoryResult<usize> {
    let mut n:Option<usize> = None;
    for adc in meas.iter().flat_map(|m| m.adcs.iter()) {
        let s = match adc.samples {
            Some(s) if s > 0 => s,
            _ => return Err(TrajectoryError::Format(format!("adc at {} has no sample count",adc.start))),
        };
        match n {
            None => n = Some(s),
            Some(n) if n != s => return Err(TrajectoryError::Mismatch(format!("adc at {} has {} samples, expected {}",adc.start,s,n))),
            _ => {}
        }
    }
    n.ok_or_else(|| TrajectoryError::Format(String::from("no adcs found in event blocks")))
}

/// moment of one axis at every adc sample, ordered [adc][sample]
fn sample_axis(g:&[f64],meas:&[Measurement],n_samples:usize,max_len:usize,opts:&AdcOptions) -> Vec<Vec<f64>> {
    let dt = opts.dt as f64;
    let xt:Vec<f64> = (0..max_len).map(|j| (j as f64 + opts.gradient_shift)*dt).collect();
    let mut lines = Vec::new();
    for m in meas {
        let mut moment:Vec<f64> = utils::cumsum(&g[m.ksp_start..m.stop]).iter().map(|v| v*dt).collect();
        moment.resize(max_len,0.0);
        for adc in m.adcs {
            let adc_dt = adc.duration as f64/n_samples as f64;
            let offset = adc.start as f64 - m.ksp_time as f64;
            let adc_t:Vec<f64> = (0..n_samples).map(|i| i as f64*adc_dt + offset + opts.adc_shift*adc_dt).collect();
            lines.push(utils::interp(&adc_t,&xt,&moment));
        }
    }
    lines
}

pub fn adc_trajectory(gx:&[f64],gy:&[f64],gz:&[f64],blocks:&[EventBlock],opts:&AdcOptions) -> TrajectoryResult<AdcTrajectory> {
    if gx.len() != gy.len() || gx.len() != gz.len() {
        return Err(TrajectoryError::Mismatch(format!("gradient lengths differ: x {}, y {}, z {}",gx.len(),gy.len(),gz.len())));
    }
    if opts.dt <= 0 {
        return Err(TrajectoryError::Value(format!("gradient raster must be positive, got {}",opts.dt)));
    }
    if !opts.unit.is_finite() || !opts.adc_shift.is_finite() || !opts.gradient_shift.is_finite() {
        return Err(TrajectoryError::Value(String::from("unit and shifts must be finite")));
    }

    let meas = measurements(blocks,opts.dt,gx.len())?;
    let n_samples = samples_per_adc(&meas)?;
    let max_len = meas.iter().map(|m| m.len()).max().unwrap_or(0);
    let n_lines:usize = meas.iter().map(|m| m.adcs.len()).sum();

    let axes:Vec<Vec<Vec<f64>>> = [gx,gy,gz].iter().map(|g| sample_axis(g,&meas,n_samples,max_len,opts)).collect();

    let mut data = Array3::<f64>::zeros((3,n_samples,n_lines));
    for line in 0..n_lines {
        for s in 0..n_samples {
            let k = opts.axes.apply([
                opts.unit*axes[0][line][s],
                opts.unit*axes[1][line][s],
                opts.unit*axes[2][line][s],
            ]);
            for (axis,v) in k.iter().enumerate() {
                data[[axis,s,line]] = *v;
            }
        }
    }

    let mut meta = Headfile::new();
    meta.insert("dt",opts.dt);
    meta.insert("unit",opts.unit);
    meta.insert("samples",n_samples);
    meta.insert("adcs",n_lines);
    meta.insert("adc_shift",opts.adc_shift);
    meta.insert("gradient_shift",opts.gradient_shift);
    if opts.axes == AxisConvention::Scanner {
        meta.insert("axes","scanner");
    }

    info!("sampled {} adcs of {} samples",n_lines,n_samples);
    Ok(AdcTrajectory{ data, meta })
}
