//! BART complex float files: a text `.hdr` with the dimensions and a raw `.cfl` of little endian
//! complex64 values in column-major order.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use byteorder::{ByteOrder, LittleEndian};
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn, ShapeBuilder};
use num_complex::Complex;
use tracing::info;
use crate::error::{io_err, MrDataError, MrDataResult};

const DIMENSIONS_KEY:&str = "# Dimensions";
const MIN_DIMS:usize = 5;

pub fn cfl_base_decode(cfl_base:&Path) -> (PathBuf,PathBuf) {
    (cfl_base.with_extension("hdr"),cfl_base.with_extension("cfl"))
}

pub fn header_text(dims:&[usize]) -> String {
    let mut dims = dims.to_vec();
    while dims.len() < MIN_DIMS {
        dims.push(1);
    }
    format!("{}\n{}\n",DIMENSIONS_KEY,utils::vec_to_string(&dims))
}

pub fn parse_header(hdr:&str) -> MrDataResult<Vec<usize>> {
    let mut lines = hdr.lines();
    while let Some(line) = lines.next() {
        if line.trim() == DIMENSIONS_KEY {
            let dim_line = lines.next().ok_or_else(|| MrDataError::Format(String::from("no dimensions after header key")))?;
            let dims = dim_line.split_whitespace()
                .map(|d| d.parse::<usize>().map_err(|_| MrDataError::Format(format!("bad dimension {:?}",d))))
                .collect::<MrDataResult<Vec<usize>>>()?;
            if dims.is_empty() {
                return Err(MrDataError::Format(String::from("empty dimension list")));
            }
            return Ok(dims);
        }
    }
    Err(MrDataError::Format(format!("{} not found in header",DIMENSIONS_KEY)))
}

pub fn load_cfl_header(cfl_base:&Path) -> MrDataResult<Vec<usize>> {
    let (hdr,_) = cfl_base_decode(cfl_base);
    let s = std::fs::read_to_string(&hdr).map_err(io_err(&hdr))?;
    parse_header(&s)
}

fn complex_to_bytes<'a,I>(values:I,numel:usize) -> Vec<u8>
where I:Iterator<Item=&'a Complex<f32>> {
    let mut flat:Vec<f32> = Vec::with_capacity(2*numel);
    values.for_each(|c_val| {
        flat.push(c_val.re);
        flat.push(c_val.im);
    });
    let mut byte_buff:Vec<u8> = vec![0;flat.len()*4];
    LittleEndian::write_f32_into(&flat,&mut byte_buff);
    byte_buff
}

/// write an n-d complex array. The hdr/cfl pair is committed together or not at all.
pub fn write_cfl<S,D>(array:&ArrayBase<S,D>,cfl_base:&Path) -> MrDataResult<()>
where S:Data<Elem=Complex<f32>>, D:Dimension {
    let (hdr,cfl) = cfl_base_decode(cfl_base);
    // iterating the transposed view visits the first axis fastest
    let bytes = complex_to_bytes(array.t().iter(),array.len());
    let hdr_str = header_text(array.shape());
    utils::write_atomic_set(&[(hdr.as_path(),hdr_str.as_bytes()),(cfl.as_path(),&bytes[..])]).map_err(io_err(&cfl))?;
    info!("wrote {:?} with dimensions {:?}",cfl,array.shape());
    Ok(())
}

/// write a real-valued array with zero imaginary part
pub fn write_cfl_real<S,D>(array:&ArrayBase<S,D>,cfl_base:&Path) -> MrDataResult<()>
where S:Data<Elem=f64>, D:Dimension {
    let complex = array.mapv(|x| Complex::new(x as f32,0.0));
    write_cfl(&complex,cfl_base)
}

/// write a sample vector as an N x 1 x 1 x 1 x 1 complex array
pub fn write_samples(samples:&[f64],cfl_base:&Path) -> MrDataResult<()> {
    let arr = ndarray::ArrayView1::from(samples);
    write_cfl_real(&arr,cfl_base)
}

fn load(cfl:&Path,numel:usize) -> MrDataResult<Vec<f32>> {
    let mut f = File::open(cfl).map_err(io_err(cfl))?;
    let mut buf = Vec::<u8>::new();
    f.read_to_end(&mut buf).map_err(io_err(cfl))?;
    let expected = numel.checked_mul(8)
        .ok_or_else(|| MrDataError::Format(format!("{} elements do not fit in memory",numel)))?;
    if buf.len() < expected {
        return Err(MrDataError::Truncated{expected,found:buf.len()});
    }
    if buf.len() > expected {
        return Err(MrDataError::Format(format!("{:?} holds {} bytes but the header declares {}",cfl,buf.len(),expected)));
    }
    let mut fbuf:Vec<f32> = vec![0.0;numel*2];
    LittleEndian::read_f32_into(&buf,&mut fbuf);
    Ok(fbuf)
}

pub fn read_cfl(cfl_base:&Path) -> MrDataResult<ArrayD<Complex<f32>>> {
    let dims = load_cfl_header(cfl_base)?;
    let (_,cfl) = cfl_base_decode(cfl_base);
    let numel = dims.iter().try_fold(1usize,|n,&d| n.checked_mul(d))
        .ok_or_else(|| MrDataError::Format(format!("dimensions {:?} overflow the element count",dims)))?;
    let flat = load(&cfl,numel)?;
    let complex:Vec<Complex<f32>> = flat.chunks_exact(2).map(|c| Complex::new(c[0],c[1])).collect();
    ArrayD::from_shape_vec(IxDyn(&dims).f(),complex)
        .map_err(|e| MrDataError::Format(format!("cannot shape cfl data to {:?}: {}",dims,e)))
}

/// real parts of all values in file order
pub fn read_real(cfl_base:&Path) -> MrDataResult<Vec<f64>> {
    let arr = read_cfl(cfl_base)?;
    Ok(arr.t().iter().map(|c| c.re as f64).collect())
}
