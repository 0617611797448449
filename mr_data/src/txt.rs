//! Plain text export, one sample (or one k-space point) per line.
//! Rust float formatting never depends on the locale, so the decimal separator is always '.'.

use std::path::Path;
use tracing::info;
use crate::error::{io_err, MrDataError, MrDataResult};

pub fn samples_to_txt(samples:&[f64]) -> String {
    let mut s = String::new();
    samples.iter().for_each(|val| {
        s.push_str(&format!("{}\n",val));
    });
    s
}

pub fn points_to_txt(points:&[[f64;3]]) -> String {
    let mut s = String::new();
    points.iter().for_each(|p| {
        s.push_str(&format!("{} {} {}\n",p[0],p[1],p[2]));
    });
    s
}

pub fn write_txt(samples:&[f64],file_path:&Path) -> MrDataResult<()> {
    utils::write_atomic(file_path,samples_to_txt(samples).as_bytes()).map_err(io_err(file_path))?;
    info!("wrote {} samples to {:?}",samples.len(),file_path);
    Ok(())
}

pub fn write_points_txt(points:&[[f64;3]],file_path:&Path) -> MrDataResult<()> {
    utils::write_atomic(file_path,points_to_txt(points).as_bytes()).map_err(io_err(file_path))?;
    info!("wrote {} points to {:?}",points.len(),file_path);
    Ok(())
}

/// parse text back into numbers. Values may be separated by whitespace or commas; blank lines and
/// lines starting with '#' are skipped.
pub fn parse_txt(s:&str) -> MrDataResult<Vec<f64>> {
    let mut out = Vec::new();
    for (i,line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for field in line.split(|c:char| c == ',' || c.is_whitespace()).filter(|f| !f.is_empty()) {
            let v = field.parse::<f64>().map_err(|_| MrDataError::Format(format!("line {}: {:?} is not a number",i+1,field)))?;
            out.push(v);
        }
    }
    Ok(out)
}

pub fn read_txt(file_path:&Path) -> MrDataResult<Vec<f64>> {
    let s = std::fs::read_to_string(file_path).map_err(io_err(file_path))?;
    parse_txt(&s)
}
