use std::path::PathBuf;
use trajectory::Nuclide;

#[derive(clap::Parser,Debug)]
#[command(name = "dsv_tools", about = "convert Siemens sequence simulation output (.dsv) to other formats")]
pub struct DsvToolsArgs {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand,Debug)]
pub enum Action {
    /// decode a single .dsv waveform file
    Decode(DecodeArgs),
    /// convert a key=value metadata file to json
    Meta(MetaArgs),
    /// extract event blocks, RF pulses and ADCs from an _INF.dsv file as json
    Inf(InfArgs),
    /// build a k-space trajectory from three gradient waveforms
    Gr2trj(Gr2TrjArgs),
    /// build a k-space trajectory from the *_GRX/_GRY/_GRZ/_INF.dsv files of a simulation directory
    Gr2trjDir(Gr2TrjDirArgs),
    /// print the factor that scales gradient moments to k-space units of 1/FOV
    Normalize(NormalizeArgs),
    /// write a default trajectory configuration file
    NewConfig(NewConfigArgs),
}

#[derive(Clone,clap::Args,Debug)]
pub struct DecodeArgs {
    pub dsv:PathBuf,
    /// output path. Json and text are printed when omitted
    pub out:Option<PathBuf>,
    /// write samples as a .cfl/.hdr pair (out is the base path)
    #[clap(long, conflicts_with_all = ["txt","meta"])]
    pub cfl:bool,
    /// write samples as text, one per line
    #[clap(long, conflicts_with = "meta")]
    pub txt:bool,
    /// write the file definitions as json (default)
    #[clap(long)]
    pub meta:bool,
    /// indent the json output
    #[clap(long, conflicts_with_all = ["cfl","txt"])]
    pub pretty:bool,
}

#[derive(Clone,clap::Args,Debug)]
pub struct MetaArgs {
    pub file:PathBuf,
    pub out:Option<PathBuf>,
    #[clap(long)]
    pub pretty:bool,
}

#[derive(Clone,clap::Args,Debug)]
pub struct InfArgs {
    pub inf:PathBuf,
    pub out:Option<PathBuf>,
}

#[derive(Clone,clap::Args,Debug,Default)]
pub struct TrajectoryArgs {
    /// _INF.dsv (or its json export). Selects adc sampling of the trajectory
    #[clap(long)]
    pub inf:Option<PathBuf>,
    /// key=value metadata carried into the trajectory sidecar
    #[clap(long)]
    pub meta:Option<PathBuf>,
    /// gradient raster time, overrides the time step of the inputs (µs when sampling at adcs)
    #[clap(long)]
    pub dt:Option<f64>,
    /// trajectory normalization factor
    #[clap(long, conflicts_with = "fov")]
    pub unit:Option<f64>,
    /// field of view in meters, the normalization factor is derived from it
    #[clap(long)]
    pub fov:Option<f64>,
    /// gradients are real-valued .cfl files instead of .dsv
    #[clap(long)]
    pub cfl_input:bool,
    /// write the trajectory as text instead of .cfl/.hdr
    #[clap(long)]
    pub txt:bool,
    /// fraction of the adc dwell time by which the samples are shifted
    #[clap(long)]
    pub adc_shift:Option<f64>,
    /// rotate simulation axes into the scanner frame (default when sampling at adcs)
    #[clap(long, conflicts_with = "simulation_axes")]
    pub scanner_axes:bool,
    /// keep the simulation axes (default for continuous trajectories)
    #[clap(long)]
    pub simulation_axes:bool,
    /// trajectory configuration (toml)
    #[clap(long)]
    pub config:Option<PathBuf>,
    /// write the trajectory metadata as json to this path
    #[clap(long)]
    pub sidecar:Option<PathBuf>,
}

#[derive(Clone,clap::Args,Debug)]
pub struct Gr2TrjArgs {
    pub gx:PathBuf,
    pub gy:PathBuf,
    pub gz:PathBuf,
    pub out:PathBuf,
    #[command(flatten)]
    pub opts:TrajectoryArgs,
}

#[derive(Clone,clap::Args,Debug)]
pub struct Gr2TrjDirArgs {
    /// simulation output directory
    pub dir:PathBuf,
    pub out:PathBuf,
    /// ignore a discovered _INF.dsv and integrate the full waveforms
    #[clap(long, conflicts_with = "inf")]
    pub continuous:bool,
    #[command(flatten)]
    pub opts:TrajectoryArgs,
}

#[derive(Clone,clap::Args,Debug)]
pub struct NormalizeArgs {
    /// field of view in meters
    pub fov:f64,
    /// T/m per gradient unit
    #[clap(long)]
    pub gx_unit:Option<f64>,
    /// s per time unit
    #[clap(long)]
    pub dt_unit:Option<f64>,
    /// gyromagnetic ratio in Hz/T
    #[clap(long, conflicts_with = "nuclide")]
    pub gamma:Option<f64>,
    /// proton, carbon13, fluorine19, sodium23 or phosphorus31
    #[clap(long)]
    pub nuclide:Option<Nuclide>,
    #[clap(long)]
    pub config:Option<PathBuf>,
}

#[derive(Clone,clap::Args,Debug)]
pub struct NewConfigArgs {
    /// output file, .toml is added when there is no extension
    pub path:PathBuf,
}
