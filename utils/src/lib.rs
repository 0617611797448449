use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, Encoding};
use glob::glob;
use tracing::debug;

/// read a whole file as ISO-8859-1 (latin1) text. Every byte maps to a char so this only fails on io errors.
pub fn read_latin1(file_path:&Path) -> io::Result<String> {
    let mut f = File::open(file_path)?;
    let mut bytes = Vec::<u8>::new();
    f.read_to_end(&mut bytes)?;
    ISO_8859_1.decode(&bytes, DecoderTrap::Strict)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData,format!("cannot decode {:?} as latin1: {}",file_path,e)))
}

pub fn trim_newline(line:&str) -> &str {
    line.trim_end_matches(|c| c == '\n' || c == '\r')
}

pub fn vec_to_string<T>(vec:&[T]) -> String
    where T:std::string::ToString {
    let vstr:Vec<String> = vec.iter().map(|num| num.to_string()).collect();
    vstr.join(" ")
}

// single depth search
pub fn get_first_match(dir:&Path,pattern:&str) -> Option<PathBuf>  {
    let pat = dir.join(pattern);
    let pat = pat.to_str()?;
    let mut matches:Vec<PathBuf> = glob(pat).ok()?.flatten().collect();
    match matches.is_empty() {
        true => None,
        false => Some(matches.remove(0))
    }
}

fn partial_path(path:&Path) -> PathBuf {
    let mut name:OsString = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// write bytes to a file so that the target either receives the complete contents or is not touched at all
pub fn write_atomic(path:&Path,bytes:&[u8]) -> io::Result<()> {
    write_atomic_set(&[(path,bytes)])
}

/// write a group of files (e.g. a cfl/hdr pair) all-or-nothing
pub fn write_atomic_set(files:&[(&Path,&[u8])]) -> io::Result<()> {
    let mut staged = Vec::<(PathBuf,&Path)>::with_capacity(files.len());
    for (path,bytes) in files {
        let tmp = partial_path(path);
        let result = File::create(&tmp).and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        });
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(e);
        }
        staged.push((tmp,*path));
    }
    for (i,(tmp,path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp,path) {
            // roll back whatever was already committed so no half pair survives
            staged[..i].iter().for_each(|(_,done)| { let _ = fs::remove_file(done); });
            discard(&staged[i..]);
            return Err(e);
        }
        debug!("wrote {:?}",path);
    }
    Ok(())
}

fn discard(staged:&[(PathBuf,&Path)]) {
    staged.iter().for_each(|(tmp,_)| { let _ = fs::remove_file(tmp); });
}

/// running sum, inclusive of the current element
pub fn cumsum(x:&[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    x.iter().map(|val| {
        acc += *val;
        acc
    }).collect()
}

/// piecewise-linear interpolation of (xp,fp) at x. xp must be increasing.
/// points outside of xp are clamped to the first and last fp values.
/// Only the pairs present in both xp and fp are used when their lengths differ.
pub fn interp(x:&[f64],xp:&[f64],fp:&[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    let (xp,fp) = (&xp[..n],&fp[..n]);
    if xp.is_empty() {
        return vec![0.0;x.len()];
    }
    let last = xp.len() - 1;
    x.iter().map(|&t| {
        if t <= xp[0] {
            return fp[0];
        }
        if t >= xp[last] {
            return fp[last];
        }
        // first index with xp[idx] > t. idx is in 1..=last here
        let idx = xp.partition_point(|&v| v <= t);
        let (x0,x1) = (xp[idx-1],xp[idx]);
        let (y0,y1) = (fp[idx-1],fp[idx]);
        y0 + (t - x0)*(y1 - y0)/(x1 - x0)
    }).collect()
}

static SCRATCH_COUNT:AtomicUsize = AtomicUsize::new(0);

/// create a fresh, empty directory under the system temp dir
pub fn scratch_dir(label:&str) -> io::Result<PathBuf> {
    let n = SCRATCH_COUNT.fetch_add(1,Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("dsvtools_{}_{}_{}",label,std::process::id(),n));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
