use std::path::Path;
use std::sync::OnceLock;
use headfile::{Headfile, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::error::{format_err, DsvError, DsvResult};

const SAMPLES_IN_SCAN:&str = "ushSamplesInScan";

/// RF pulse of an event block. start is relative to the block start, times in µs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfPulse {
    pub start:i64,
    pub duration:i64,
}

/// One readout with its measurement header entries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adc {
    pub start:i64,
    pub duration:i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples:Option<usize>,
    #[serde(flatten)]
    pub header:Headfile,
}

impl Adc {
    pub fn new(start:i64,duration:i64) -> Self {
        Self {
            start,
            duration,
            samples:None,
            header:Headfile::new(),
        }
    }

    /// None when start + duration does not fit in 64 bits
    pub fn end(&self) -> Option<i64> {
        self.start.checked_add(self.duration)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventBlock {
    pub start:i64,
    pub duration:i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rf:Option<RfPulse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adcs:Vec<Adc>,
}

impl EventBlock {
    pub fn new(start:i64,duration:i64) -> Self {
        Self {
            start,
            duration,
            rf:None,
            adcs:Vec::new(),
        }
    }

    /// None when start + duration does not fit in 64 bits
    pub fn end(&self) -> Option<i64> {
        self.start.checked_add(self.duration)
    }

    /// strict containment, an adc touching the block boundary does not belong to it
    pub fn contains(&self,adc:&Adc) -> bool {
        match (adc.end(),self.end()) {
            (Some(adc_end),Some(end)) => adc.start > self.start && adc_end < end,
            _ => false,
        }
    }
}

struct Patterns {
    header_end:Regex,
    event_block:Regex,
    info_block_end:Regex,
    adc_start:Regex,
    adc_value:Regex,
    rf_value:Regex,
}

fn patterns() -> &'static Patterns {
    static P:OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        header_end: Regex::new(r"^\[INFO\]$").expect("invalid regex"),
        event_block: Regex::new(r"^\* EventBlock ([0-9]+) ([0-9]+)$").expect("invalid regex"),
        info_block_end: Regex::new(r"^#INFO-END$").expect("invalid regex"),
        adc_start: Regex::new(r"^adc MeasHeader ([0-9]+) ([0-9]+)$").expect("invalid regex"),
        adc_value: Regex::new(r"^([^:]+) *: ([^;]+)").expect("invalid regex"),
        rf_value: Regex::new(r"^\|\s+([0-9]+) \| \[\S+\]:\s+[0-9.]+/\s*([0-9]+)\s+\|.*$").expect("invalid regex"),
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Start,
    InfoBlock,
    MeasHeader,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::InfoBlock => "info_block",
            State::MeasHeader => "mdh_block",
        }
    }
}

#[derive(Debug, PartialEq)]
enum Line {
    Block(i64,i64),
    Adc(i64,i64),
    Rf(i64,i64),
    HeaderValue(String,String),
    Other,
}

struct LineParser {
    state:State,
}

fn times(caps:&regex::Captures) -> Option<(i64,i64)> {
    let start = caps.get(1)?.as_str().parse().ok()?;
    let duration = caps.get(2)?.as_str().parse().ok()?;
    Some((start,duration))
}

impl LineParser {
    fn new() -> Self {
        Self {
            state:State::Start,
        }
    }

    fn parse(&mut self,line:&str) -> Result<Line,String> {
        let p = patterns();
        let too_large = || String::from("time value does not fit in 64 bits");
        match self.state {
            State::Start => {
                if let Some(caps) = p.adc_start.captures(line) {
                    self.state = State::MeasHeader;
                    let (s,d) = times(&caps).ok_or_else(too_large)?;
                    return Ok(Line::Adc(s,d));
                }
                if let Some(caps) = p.event_block.captures(line) {
                    self.state = State::InfoBlock;
                    let (s,d) = times(&caps).ok_or_else(too_large)?;
                    return Ok(Line::Block(s,d));
                }
            }
            State::InfoBlock => {
                if let Some(caps) = p.rf_value.captures(line) {
                    let (s,d) = times(&caps).ok_or_else(too_large)?;
                    return Ok(Line::Rf(s,d));
                }
                if p.info_block_end.is_match(line) {
                    self.state = State::Start;
                }
            }
            State::MeasHeader => {
                if let Some(caps) = p.adc_value.captures(line) {
                    let key = caps[1].trim().to_string();
                    let value = caps[2].trim().to_string();
                    return Ok(Line::HeaderValue(key,value));
                }
                if p.header_end.is_match(line) {
                    self.state = State::Start;
                } else {
                    return Err(String::from("found neither a measurement header entry nor the end of the header"));
                }
            }
        }
        Ok(Line::Other)
    }
}

/// Parse the text of an _INF.dsv file into event blocks with their RF pulses and ADCs
pub fn parse_inf(text:&str) -> DsvResult<Vec<EventBlock>> {
    let mut parser = LineParser::new();
    let mut blocks = Vec::<EventBlock>::new();
    let mut adcs = Vec::<Adc>::new();
    for (i,line) in text.lines().enumerate() {
        let line = utils::trim_newline(line);
        let state = parser.state;
        let parsed = parser.parse(line).map_err(|cause| {
            DsvError::Format(format!("in context {}, could not parse line {}: {:?} ({})",state.name(),i,line,cause))
        })?;
        match parsed {
            Line::Block(start,duration) => {
                let block = EventBlock::new(start,duration);
                if block.end().is_none() {
                    return format_err(format!("line {}: event block end overflows 64 bits",i));
                }
                blocks.push(block);
            }
            Line::Adc(start,duration) => {
                let adc = Adc::new(start,duration);
                if adc.end().is_none() {
                    return format_err(format!("line {}: adc end overflows 64 bits",i));
                }
                adcs.push(adc);
            }
            Line::Rf(start,duration) => match blocks.last_mut() {
                Some(block) => block.rf = Some(RfPulse{start,duration}),
                None => return format_err(format!("line {}: RF pulse outside of an event block",i)),
            },
            Line::HeaderValue(key,value) => {
                let adc = match adcs.last_mut() {
                    Some(adc) => adc,
                    None => return format_err(format!("line {}: header entry outside of an adc",i)),
                };
                if key == SAMPLES_IN_SCAN {
                    let n:usize = value.parse().map_err(|_| DsvError::Format(format!("line {}: {} {:?} is not a sample count",i,SAMPLES_IN_SCAN,value)))?;
                    adc.samples = Some(n);
                }
                if matches!(key.as_str(),"start" | "duration" | "samples") {
                    debug!("line {}: header entry {} shadows an adc field, skipped",i,key);
                } else {
                    adc.header.insert(key,Value::coerce(&value));
                }
            }
            Line::Other => {}
        }
    }
    debug!("found {} event blocks and {} adcs",blocks.len(),adcs.len());
    Ok(join_adcs(blocks,adcs))
}

/// attach every adc to the event block containing it. The search starts at the block of the previous
/// adc and wraps around; adcs outside of all blocks are dropped.
fn join_adcs(mut blocks:Vec<EventBlock>,adcs:Vec<Adc>) -> Vec<EventBlock> {
    let n = blocks.len();
    let mut last_index = 0;
    for adc in adcs {
        let found = (0..n).map(|step| (last_index + step) % n).find(|&i| blocks[i].contains(&adc));
        match found {
            Some(i) => {
                last_index = i;
                blocks[i].adcs.push(adc);
            }
            None => warn!("discarding lonely adc with start time {}",adc.start),
        }
    }
    blocks
}

pub fn read_inf(file_path:&Path) -> DsvResult<Vec<EventBlock>> {
    let s = utils::read_latin1(file_path).map_err(|source| DsvError::Io {
        path: file_path.to_owned(),
        source,
    })?;
    parse_inf(&s)
}

pub fn blocks_to_json(blocks:&[EventBlock]) -> DsvResult<String> {
    Ok(headfile::json::to_string_spaced(blocks)?)
}

pub fn blocks_from_json(s:&str) -> DsvResult<Vec<EventBlock>> {
    let blocks:Vec<EventBlock> = serde_json::from_str(s)?;
    for block in &blocks {
        if block.end().is_none() || block.adcs.iter().any(|a| a.end().is_none()) {
            return format_err(format!("event block at {} has times that overflow 64 bits",block.start));
        }
    }
    Ok(blocks)
}

/// read event blocks from either an _INF.dsv file or its JSON export (decided by the .json extension)
pub fn load_blocks(file_path:&Path) -> DsvResult<Vec<EventBlock>> {
    let is_json = file_path.extension().map(|e| e.eq_ignore_ascii_case("json")).unwrap_or(false);
    match is_json {
        true => {
            let s = std::fs::read_to_string(file_path).map_err(|source| DsvError::Io {
                path: file_path.to_owned(),
                source,
            })?;
            blocks_from_json(&s)
        }
        false => read_inf(file_path),
    }
}
