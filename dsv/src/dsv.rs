use std::path::Path;
use headfile::{Headfile, Value};
use tracing::debug;
use crate::error::{format_err, DsvError, DsvResult};

pub const DSV_FORMAT:&str = "DSV_V0100";

const SAMPLES:&str = "SAMPLES";
const VERTFACTOR:&str = "VERTFACTOR";
const VERTUNITNAME:&str = "VERTUNITNAME";
const HORIDELTA:&str = "HORIDELTA";
const HORIUNITNAME:&str = "HORIUNITNAME";

/// Unit of the horizontal (time) axis of a DSV file
#[derive(Clone, Debug, PartialEq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
    Other(String),
}

impl TimeUnit {
    pub fn from_name(name:&str) -> Self {
        match name.trim() {
            "s" => TimeUnit::Seconds,
            "ms" => TimeUnit::Milliseconds,
            // "\u{c2}\u{b5}s" is a utf-8 micro sign that went through latin1
            "\u{b5}s" | "\u{c2}\u{b5}s" | "\u{3bc}s" | "us" => TimeUnit::Microseconds,
            "ns" => TimeUnit::Nanoseconds,
            other => TimeUnit::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "\u{b5}s",
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Other(s) => s,
        }
    }

    /// length of one unit in seconds, if known
    pub fn seconds(&self) -> Option<f64> {
        match self {
            TimeUnit::Seconds => Some(1.0),
            TimeUnit::Milliseconds => Some(1E-3),
            TimeUnit::Microseconds => Some(1E-6),
            TimeUnit::Nanoseconds => Some(1E-9),
            TimeUnit::Other(_) => None,
        }
    }
}

/// Samples of one waveform (e.g. one gradient axis) on a uniform time grid
#[derive(Clone, Debug, PartialEq)]
pub struct SampleSequence {
    samples:Vec<f64>,
    time_step:f64,
    time_unit:TimeUnit,
}

impl SampleSequence {
    pub fn new(samples:Vec<f64>,time_step:f64,time_unit:TimeUnit) -> Self {
        Self {
            samples,
            time_step,
            time_unit,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// time between two samples, in time_unit
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn time_unit(&self) -> &TimeUnit {
        &self.time_unit
    }

    pub fn time_step_seconds(&self) -> Option<f64> {
        self.time_unit.seconds().map(|s| s*self.time_step)
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Section {
    Start,
    FileType,
    Definitions,
    Values,
}

/// sections of a DSV file before any interpretation of the values
#[derive(Debug, Default)]
struct RawDsv {
    format:Option<String>,
    definitions:Option<Headfile>,
    values:Option<Vec<i64>>,
}

fn parse_sections(text:&str) -> DsvResult<RawDsv> {
    let mut raw = RawDsv::default();
    let mut section = Section::Start;
    for (i,line) in text.lines().enumerate() {
        let line = utils::trim_newline(line);
        match line {
            "[FILETYPE]" => {
                section = Section::FileType;
                continue;
            }
            "[DEFINITIONS]" => {
                if raw.definitions.is_some() {
                    return format_err(format!("line {}: second [DEFINITIONS] section",i+1));
                }
                raw.definitions = Some(Headfile::new());
                section = Section::Definitions;
                continue;
            }
            "[VALUES]" => {
                if raw.values.is_some() {
                    return format_err(format!("line {}: second [VALUES] section",i+1));
                }
                raw.values = Some(Vec::new());
                section = Section::Values;
                continue;
            }
            _ => {}
        }
        match section {
            Section::FileType => {
                if let Some(format) = line.strip_prefix("FORMAT=") {
                    if raw.format.is_some() {
                        return format_err(format!("line {}: second FORMAT entry",i+1));
                    }
                    if format != DSV_FORMAT {
                        return format_err(format!("format {} is not understood (expected {})",format,DSV_FORMAT));
                    }
                    raw.format = Some(format.to_string());
                    section = Section::Start;
                }
            }
            Section::Definitions => {
                // keys never contain '=', values might
                match line.rsplit_once('=') {
                    Some((key,val)) => {
                        let defs = raw.definitions.get_or_insert_with(Headfile::new);
                        if defs.contains_key(key) {
                            return format_err(format!("line {}: definition {} given twice",i+1,key));
                        }
                        defs.insert(key,Value::coerce(val));
                    }
                    None => section = Section::Start,
                }
            }
            Section::Values => {
                let v = line.trim();
                if v.is_empty() {
                    section = Section::Start;
                    continue;
                }
                let v:i64 = v.parse().map_err(|_| DsvError::Format(format!("line {}: {:?} is not an integer value",i+1,v)))?;
                raw.values.get_or_insert_with(Vec::new).push(v);
            }
            Section::Start => {}
        }
    }
    Ok(raw)
}

/// Undo DSV value compression.
/// The first value is absolute, all following values are deltas. Whenever a delta equals the value
/// before it, the next value is the number of additional repetitions of that delta.
pub fn decompress(values:&[i64],n_samples:usize) -> DsvResult<Vec<i64>> {
    let mut iter = values.iter();
    let first = match iter.next() {
        Some(v) => *v,
        None if n_samples == 0 => return Ok(Vec::new()),
        None => return Err(DsvError::Truncated{declared:n_samples,found:0}),
    };
    if n_samples == 0 {
        return format_err("values present but SAMPLES is 0");
    }
    let overflow = || DsvError::Format(String::from("sample value overflows 64 bit integer"));
    // SAMPLES is untrusted, a truncated file must not reserve what it claims
    let mut out = Vec::<i64>::with_capacity(n_samples.min(values.len().saturating_mul(2)));
    out.push(first);
    let mut last = Some(first);
    let mut pending_repeat:Option<i64> = None;
    for &x in iter {
        let prev = out[out.len()-1];
        match pending_repeat.take() {
            Some(delta) => {
                let count = usize::try_from(x).map_err(|_| DsvError::Format(format!("negative repeat count {}",x)))?;
                if out.len().saturating_add(count) > n_samples {
                    return format_err(format!("decompression yields more than the {} declared samples",n_samples));
                }
                let mut acc = prev;
                for _ in 0..count {
                    acc = acc.checked_add(delta).ok_or_else(overflow)?;
                    out.push(acc);
                }
                last = None;
            }
            None => {
                if out.len() == n_samples {
                    return format_err(format!("decompression yields more than the {} declared samples",n_samples));
                }
                out.push(prev.checked_add(x).ok_or_else(overflow)?);
                if last == Some(x) {
                    pending_repeat = Some(x);
                }
                last = Some(x);
            }
        }
    }
    if out.len() < n_samples {
        return Err(DsvError::Truncated{declared:n_samples,found:out.len()});
    }
    Ok(out)
}

fn required<'a>(defs:&'a Headfile,key:&str) -> DsvResult<&'a Value> {
    defs.get(key).ok_or_else(|| DsvError::Format(format!("definition {} is missing",key)))
}

fn required_f64(defs:&Headfile,key:&str) -> DsvResult<f64> {
    let v = required(defs,key)?;
    match v.as_f64() {
        Some(x) if x.is_finite() => Ok(x),
        _ => format_err(format!("definition {}={} is not a number",key,v)),
    }
}

/// A decoded DSV file
#[derive(Clone, Debug, PartialEq)]
pub struct DsvFile {
    definitions:Headfile,
    sequence:SampleSequence,
}

impl DsvFile {

    pub fn from_file(file_path:&Path) -> DsvResult<Self> {
        let s = utils::read_latin1(file_path).map_err(|source| DsvError::Io {
            path: file_path.to_owned(),
            source,
        })?;
        let dsv = Self::parse(&s)?;
        debug!("decoded {} samples from {:?}",dsv.sequence.len(),file_path);
        Ok(dsv)
    }

    pub fn parse(text:&str) -> DsvResult<Self> {
        let raw = parse_sections(text)?;
        if raw.format.is_none() {
            return format_err(format!("no FORMAT={} entry found",DSV_FORMAT));
        }
        let definitions = match raw.definitions {
            Some(d) => d,
            None => return format_err("no [DEFINITIONS] section found"),
        };

        let n_samples = required(&definitions,SAMPLES)?;
        let n_samples = n_samples.as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| DsvError::Format(format!("SAMPLES={} is not a sample count",n_samples)))?;
        let vert_factor = required_f64(&definitions,VERTFACTOR)?;
        if vert_factor == 0.0 {
            return format_err("VERTFACTOR must not be 0");
        }
        let time_step = required_f64(&definitions,HORIDELTA)?;
        let time_unit = TimeUnit::from_name(&required(&definitions,HORIUNITNAME)?.to_string());

        let values = raw.values.unwrap_or_default();
        let samples:Vec<f64> = decompress(&values,n_samples)?
            .into_iter()
            .map(|v| v as f64/vert_factor)
            .collect();

        Ok(Self {
            definitions,
            sequence:SampleSequence::new(samples,time_step,time_unit),
        })
    }

    pub fn definitions(&self) -> &Headfile {
        &self.definitions
    }

    pub fn sequence(&self) -> &SampleSequence {
        &self.sequence
    }

    pub fn into_sequence(self) -> SampleSequence {
        self.sequence
    }

    pub fn vertical_unit(&self) -> Option<String> {
        self.definitions.get(VERTUNITNAME).map(|v| v.to_string())
    }

    /// Metadata for export: every definition except the axis descriptions, followed by
    /// yunitname, xunit and xunitname. xunit is in seconds when the time unit is known.
    pub fn meta(&self) -> Headfile {
        let special = [VERTUNITNAME,HORIDELTA,HORIUNITNAME,VERTFACTOR];
        let mut meta:Headfile = self.definitions.iter()
            .filter(|(k,_)| !special.contains(k))
            .map(|(k,v)| (k,v.clone()))
            .collect();
        if let Some(unit) = self.vertical_unit() {
            meta.insert("yunitname",unit);
        }
        match self.sequence.time_step_seconds() {
            Some(dt) => {
                meta.insert("xunit",dt);
                meta.insert("xunitname","s");
            }
            None => {
                meta.insert("xunit",self.sequence.time_step());
                meta.insert("xunitname",self.sequence.time_unit().name());
            }
        }
        meta
    }
}

/// decode a DSV file into its sample sequence
pub fn read_dsv(file_path:&Path) -> DsvResult<SampleSequence> {
    Ok(DsvFile::from_file(file_path)?.into_sequence())
}
