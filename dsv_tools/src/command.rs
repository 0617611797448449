use std::error::Error;
use std::path::{Path, PathBuf};
use dsv::{DsvFile, SampleSequence, TimeUnit};
use headfile::Headfile;
use tracing::{info, warn};
use trajectory::assemble::check_axes;
use trajectory::{adc_trajectory, assemble, normalizer, AdcOptions, AdcTrajectory, AssemblyOptions, AxisConvention,
                 ConfigFile, NormalizerConfig, Trajectory, TrajectoryConfig, TrajectoryError, TrajectoryResult};
use crate::args::*;

pub type CmdResult<T> = Result<T,Box<dyn Error>>;

const GRX:&str = "GRX";
const GRY:&str = "GRY";
const GRZ:&str = "GRZ";
const INF:&str = "INF";

/// write text to out, or print it when there is no output path
fn emit(text:&str,out:Option<&Path>) -> CmdResult<()> {
    match out {
        Some(out) => {
            utils::write_atomic(out,text.as_bytes())?;
            info!("wrote {:?}",out);
        }
        None => print!("{}",text),
    }
    Ok(())
}

pub fn decode(args:&DecodeArgs) -> CmdResult<()> {
    let file = DsvFile::from_file(&args.dsv)?;
    let samples = file.sequence().samples();
    if args.cfl {
        let out = args.out.as_deref().ok_or("--cfl needs an output path")?;
        mr_data::cfl::write_samples(samples,out)?;
    } else if args.txt {
        match &args.out {
            Some(out) => mr_data::txt::write_txt(samples,out)?,
            None => print!("{}",mr_data::txt::samples_to_txt(samples)),
        }
    } else {
        let mut json = match args.pretty {
            true => file.meta().to_json_pretty()?,
            false => file.meta().to_json()?,
        };
        json.push('\n');
        emit(&json,args.out.as_deref())?;
    }
    Ok(())
}

pub fn meta(args:&MetaArgs) -> CmdResult<()> {
    let h = Headfile::from_file(&args.file)?;
    info!("read {} entries from {:?}",h.len(),args.file);
    let mut json = match args.pretty {
        true => h.to_json_pretty()?,
        false => h.to_json()?,
    };
    json.push('\n');
    emit(&json,args.out.as_deref())
}

pub fn inf(args:&InfArgs) -> CmdResult<()> {
    let blocks = dsv::inf::read_inf(&args.inf)?;
    let n_adcs:usize = blocks.iter().map(|b| b.adcs.len()).sum();
    info!("found {} event blocks holding {} adcs",blocks.len(),n_adcs);
    let mut json = dsv::inf::blocks_to_json(&blocks)?;
    json.push('\n');
    emit(&json,args.out.as_deref())
}

/// config file values, overridden by command line flags
fn load_config(opts:&TrajectoryArgs) -> CmdResult<TrajectoryConfig> {
    let mut cfg = match &opts.config {
        Some(path) => TrajectoryConfig::from_file(path)?,
        None => TrajectoryConfig::default(),
    };
    if let Some(shift) = opts.adc_shift {
        cfg.adc_shift = shift;
    }
    if opts.scanner_axes {
        cfg.axes = Some(AxisConvention::Scanner);
    }
    if opts.simulation_axes {
        cfg.axes = Some(AxisConvention::Simulation);
    }
    Ok(cfg)
}

fn trajectory_unit(opts:&TrajectoryArgs,cfg:&TrajectoryConfig) -> CmdResult<f64> {
    Ok(match (opts.unit,opts.fov) {
        (Some(unit),_) => unit,
        (None,Some(fov)) => normalizer(fov,&cfg.normalizer)?,
        (None,None) => 1.0,
    })
}

fn read_gradient(path:&Path,opts:&TrajectoryArgs) -> CmdResult<SampleSequence> {
    match opts.cfl_input {
        true => {
            let samples = mr_data::cfl::read_real(path)?;
            Ok(SampleSequence::new(samples,opts.dt.unwrap_or(1.0),TimeUnit::Microseconds))
        }
        false => Ok(dsv::read_dsv(path)?),
    }
}

/// gradient raster on the µs grid of the INF file
fn raster_us(g:&SampleSequence,dt:Option<f64>) -> CmdResult<i64> {
    let dt = match dt {
        Some(dt) => dt,
        None => g.time_step_seconds().map(|s| s/1E-6).unwrap_or(g.time_step()),
    };
    let r = dt.round();
    if !dt.is_finite() || r < 1.0 || (dt - r).abs() > 1E-6 {
        return Err(TrajectoryError::Value(format!("gradient raster of {} µs is not a positive whole number",dt)).into());
    }
    Ok(r as i64)
}

/// trajectory flavour selected by the presence of an INF file
enum Built {
    Continuous(Trajectory),
    Adc(AdcTrajectory),
}

impl Built {
    fn write(&self,out:&Path,txt:bool) -> TrajectoryResult<()> {
        match (self,txt) {
            (Built::Continuous(t),true) => t.write_txt(out),
            (Built::Continuous(t),false) => t.write_cfl(out),
            (Built::Adc(t),true) => t.write_txt(out),
            (Built::Adc(t),false) => t.write_cfl(out),
        }
    }
}

/// delete a trajectory whose sidecar could not be written
fn remove_output(out:&Path,txt:bool) {
    let paths = match txt {
        true => vec![out.to_owned()],
        false => {
            let (hdr,cfl) = mr_data::cfl::cfl_base_decode(out);
            vec![hdr,cfl]
        }
    };
    for path in paths {
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("could not remove {:?}: {}",path,e);
        }
    }
}

fn build_trajectory(gradients:[&Path;3],inf:Option<&Path>,out:&Path,opts:&TrajectoryArgs) -> CmdResult<()> {
    let cfg = load_config(opts)?;
    let unit = trajectory_unit(opts,&cfg)?;
    let g = gradients.iter().map(|p| read_gradient(p,opts)).collect::<CmdResult<Vec<SampleSequence>>>()?;
    let meta = match &opts.meta {
        Some(path) => Headfile::from_file(path)?,
        None => Headfile::new(),
    };

    let (built,meta) = match inf {
        None => {
            let a_opts = AssemblyOptions {
                dt:opts.dt,
                unit,
                axes:cfg.continuous_axes(),
            };
            let trj = assemble(&g[0],&g[1],&g[2],&meta,&a_opts)?;
            let meta = trj.meta().clone();
            (Built::Continuous(trj),meta)
        }
        Some(inf) => {
            check_axes(&g[0],&g[1],&g[2])?;
            let blocks = dsv::inf::load_blocks(inf)?;
            let a_opts = AdcOptions {
                dt:raster_us(&g[0],opts.dt)?,
                unit,
                adc_shift:cfg.adc_shift,
                gradient_shift:cfg.gradient_shift,
                axes:cfg.adc_axes(),
            };
            info!("sampling at adcs of {} event blocks from {:?}",blocks.len(),inf);
            let trj = adc_trajectory(g[0].samples(),g[1].samples(),g[2].samples(),&blocks,&a_opts)?;
            let mut meta = meta;
            meta.merge(trj.meta());
            (Built::Adc(trj),meta)
        }
    };

    let sidecar = match &opts.sidecar {
        Some(path) => {
            let mut json = meta.to_json_pretty()?;
            json.push('\n');
            Some((path,json))
        }
        None => None,
    };
    built.write(out,opts.txt)?;
    if let Some((path,json)) = sidecar {
        if let Err(e) = utils::write_atomic(path,json.as_bytes()) {
            remove_output(out,opts.txt);
            return Err(format!("could not write metadata to {:?}: {}",path,e).into());
        }
        info!("wrote metadata to {:?}",path);
    }
    Ok(())
}

pub fn gr2trj(args:&Gr2TrjArgs) -> CmdResult<()> {
    build_trajectory([args.gx.as_path(),args.gy.as_path(),args.gz.as_path()],args.opts.inf.as_deref(),&args.out,&args.opts)
}

fn find_dsv(dir:&Path,suffix:&str) -> Option<PathBuf> {
    utils::get_first_match(dir,&format!("*_{}.dsv",suffix))
}

pub fn gr2trj_dir(args:&Gr2TrjDirArgs) -> CmdResult<()> {
    if args.opts.cfl_input {
        return Err("--cfl-input cannot be used with gr2trj-dir".into());
    }
    let mut gradients = Vec::<PathBuf>::new();
    for suffix in [GRX,GRY,GRZ] {
        let path = find_dsv(&args.dir,suffix).ok_or_else(|| format!("no *_{}.dsv found in {:?}",suffix,args.dir))?;
        info!("using {:?}",path);
        gradients.push(path);
    }
    let inf = match (&args.opts.inf,args.continuous) {
        (Some(inf),_) => Some(inf.clone()),
        (None,true) => None,
        (None,false) => find_dsv(&args.dir,INF),
    };
    if let Some(inf) = &inf {
        info!("using {:?}",inf);
    }
    build_trajectory([gradients[0].as_path(),gradients[1].as_path(),gradients[2].as_path()],inf.as_deref(),&args.out,&args.opts)
}

pub fn normalize(args:&NormalizeArgs) -> CmdResult<f64> {
    let mut cfg = match &args.config {
        Some(path) => TrajectoryConfig::from_file(path)?.normalizer,
        None => NormalizerConfig::default(),
    };
    if let Some(unit) = args.gx_unit {
        cfg.gradient_unit = unit;
    }
    if let Some(unit) = args.dt_unit {
        cfg.raster_time = unit;
    }
    if let Some(nuclide) = args.nuclide {
        cfg.nuclide = nuclide;
        cfg.gamma = None;
    }
    if let Some(gamma) = args.gamma {
        cfg.gamma = Some(gamma);
    }
    Ok(normalizer(args.fov,&cfg)?)
}

pub fn new_config(args:&NewConfigArgs) -> CmdResult<()> {
    TrajectoryConfig::default().to_file(&args.path)?;
    Ok(())
}
