use std::fs;
use std::path::{Path, PathBuf};
use dsv_tools::args::*;
use dsv_tools::command::*;
use headfile::{Headfile, Value};

/// inverse of the DSV value compression
fn compress(v:&[i64]) -> Vec<i64> {
    let mut out = Vec::new();
    if v.is_empty() {
        return out;
    }
    out.push(v[0]);
    let mut last = Some(v[0]);
    let mut i = 1;
    while i < v.len() {
        let d = v[i] - v[i-1];
        out.push(d);
        i += 1;
        if last == Some(d) {
            let mut count = 0;
            while i < v.len() && v[i] - v[i-1] == d {
                count += 1;
                i += 1;
            }
            out.push(count);
            last = None;
        } else {
            last = Some(d);
        }
    }
    out
}

/// gradient file with values in mT/m on a 10 µs raster
fn write_gradient(path:&Path,values:&[f64]) {
    let raw:Vec<i64> = values.iter().map(|v| (v*1000.0).round() as i64).collect();
    let mut s = String::from("[FILETYPE]\r\nFORMAT=DSV_V0100\r\n\r\n[DEFINITIONS]\r\nDESCRIPTION=test gradient\r\n");
    s.push_str(&format!("SAMPLES={}\r\nHORIDELTA=10\r\nHORIUNITNAME=\u{b5}s\r\nVERTFACTOR=1000\r\nVERTUNITNAME=mT/m\r\n\r\n[VALUES]\r\n",raw.len()));
    compress(&raw).iter().for_each(|v| s.push_str(&format!("{}\r\n",v)));
    s.push_str("\r\n");
    let bytes:Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    fs::write(path,bytes).unwrap();
}

const INF:&str = "\
* EventBlock 0 1000
| 100 | [Exc]:   90.0/ 100   | rf |
#INFO-END
adc MeasHeader 200 400
ushSamplesInScan : 4
ushLine : 0
[INFO]
";

fn simulation_dir(label:&str,n_y:usize) -> PathBuf {
    let dir = utils::scratch_dir(label).unwrap();
    write_gradient(&dir.join("sim_GRX.dsv"),&vec![1.0;100]);
    write_gradient(&dir.join("sim_GRY.dsv"),&vec![2.0;n_y]);
    write_gradient(&dir.join("sim_GRZ.dsv"),&vec![-1.0;100]);
    fs::write(dir.join("sim_INF.dsv"),INF).unwrap();
    dir
}

fn dir_args(dir:&Path,out:&Path,continuous:bool) -> Gr2TrjDirArgs {
    Gr2TrjDirArgs {
        dir:dir.to_owned(),
        out:out.to_owned(),
        continuous,
        opts:TrajectoryArgs {
            sidecar:Some(out.with_extension("json")),
            ..Default::default()
        },
    }
}

#[test]
fn discovered_inf_samples_adcs() {
    let dir = simulation_dir("cli_adc",100);
    let out = dir.join("trj");
    gr2trj_dir(&dir_args(&dir,&out,false)).unwrap();
    assert_eq!(mr_data::cfl::load_cfl_header(&out).unwrap(),vec![3,4,1,1,1]);
    // scanner frame unless asked otherwise: (-ky, -kx, kz)
    let k = mr_data::cfl::read_real(&out).unwrap();
    for s in 0..4 {
        let t = 100.0 + 100.0*s as f64;
        assert!((k[3*s] + 2.0*t).abs() < 1E-3);
        assert!((k[3*s+1] + t).abs() < 1E-3);
        assert!((k[3*s+2] + t).abs() < 1E-3);
    }
    let meta = Headfile::from_json(&fs::read_to_string(dir.join("trj.json")).unwrap()).unwrap();
    assert_eq!(meta.get("adcs"),Some(&Value::Int(1)));
    assert_eq!(meta.get("samples"),Some(&Value::Int(4)));
    assert_eq!(meta.get("axes"),Some(&Value::Text(String::from("scanner"))));

    let mut args = dir_args(&dir,&out,false);
    args.opts.simulation_axes = true;
    gr2trj_dir(&args).unwrap();
    let k = mr_data::cfl::read_real(&out).unwrap();
    for s in 0..4 {
        let t = 100.0 + 100.0*s as f64;
        assert!((k[3*s] - t).abs() < 1E-3);
        assert!((k[3*s+1] - 2.0*t).abs() < 1E-3);
        assert!((k[3*s+2] + t).abs() < 1E-3);
    }
}

#[test]
fn unwritable_sidecar_leaves_no_trajectory() {
    let dir = simulation_dir("cli_sidecar",100);
    for (continuous,txt) in [(false,false),(true,true)] {
        let out = match txt {
            true => dir.join("trj.txt"),
            false => dir.join("trj"),
        };
        let mut args = dir_args(&dir,&out,continuous);
        args.opts.txt = txt;
        args.opts.sidecar = Some(dir.join("no_such_dir").join("trj.json"));
        assert!(gr2trj_dir(&args).is_err());
        assert!(!dir.join("trj.cfl").exists());
        assert!(!dir.join("trj.hdr").exists());
        assert!(!dir.join("trj.txt").exists());
    }
}

#[test]
fn continuous_trajectory_as_text() {
    let dir = simulation_dir("cli_cont",100);
    let out = dir.join("trj.txt");
    let mut args = dir_args(&dir,&out,true);
    args.opts.txt = true;
    args.opts.unit = Some(0.5);
    gr2trj_dir(&args).unwrap();
    let v = mr_data::txt::read_txt(&out).unwrap();
    assert_eq!(v.len(),300);
    // point i = 0.5 * 10 * (i + 1) * g
    assert!((v[0] - 5.0).abs() < 1E-9);
    assert!((v[1] - 10.0).abs() < 1E-9);
    assert!((v[299] + 500.0).abs() < 1E-9);
}

#[test]
fn mismatched_axes_write_nothing() {
    let dir = simulation_dir("cli_mismatch",99);
    let out = dir.join("trj");
    for continuous in [true,false] {
        assert!(gr2trj_dir(&dir_args(&dir,&out,continuous)).is_err());
        assert!(!dir.join("trj.cfl").exists());
        assert!(!dir.join("trj.hdr").exists());
        assert!(!dir.join("trj.json").exists());
    }
}

#[test]
fn missing_gradient_is_reported() {
    let dir = utils::scratch_dir("cli_missing").unwrap();
    write_gradient(&dir.join("sim_GRX.dsv"),&[1.0]);
    let err = gr2trj_dir(&dir_args(&dir,&dir.join("trj"),true)).unwrap_err();
    assert!(err.to_string().contains("GRY"));
}

#[test]
fn gr2trj_from_cfl_gradients() {
    let dir = utils::scratch_dir("cli_cfl").unwrap();
    for (name,g) in [("gx",1.0),("gy",0.0),("gz",2.0)] {
        mr_data::cfl::write_samples(&[g;5],&dir.join(name)).unwrap();
    }
    let args = Gr2TrjArgs {
        gx:dir.join("gx"),
        gy:dir.join("gy"),
        gz:dir.join("gz"),
        out:dir.join("trj"),
        opts:TrajectoryArgs {
            cfl_input:true,
            dt:Some(2.0),
            scanner_axes:true,
            ..Default::default()
        },
    };
    gr2trj(&args).unwrap();
    let k = mr_data::cfl::read_real(&dir.join("trj")).unwrap();
    // last point, scanner frame: (-ky, -kx, kz)
    assert_eq!(&k[12..15],&[0.0,-10.0,20.0]);
}

#[test]
fn decode_writes_samples_and_meta() {
    let dir = utils::scratch_dir("cli_decode").unwrap();
    let dsv = dir.join("sim_GRX.dsv");
    write_gradient(&dsv,&[0.5,1.0,1.5]);
    let base = DecodeArgs{ dsv:dsv.clone(), out:Some(dir.join("gx")), cfl:true, txt:false, meta:false, pretty:false };
    decode(&base).unwrap();
    assert_eq!(mr_data::cfl::read_real(&dir.join("gx")).unwrap(),vec![0.5,1.0,1.5]);

    decode(&DecodeArgs{ out:Some(dir.join("gx.txt")), cfl:false, txt:true, ..base.clone() }).unwrap();
    assert_eq!(fs::read_to_string(dir.join("gx.txt")).unwrap(),"0.5\n1\n1.5\n");

    decode(&DecodeArgs{ out:Some(dir.join("gx.json")), cfl:false, ..base.clone() }).unwrap();
    let json = fs::read_to_string(dir.join("gx.json")).unwrap();
    assert!(json.starts_with("{\""));
    assert_eq!(json.lines().count(),1);
    let meta = Headfile::from_json(&json).unwrap();
    assert_eq!(meta.get("SAMPLES"),Some(&Value::Int(3)));
    assert_eq!(meta.get("yunitname"),Some(&Value::Text(String::from("mT/m"))));
    assert!(!meta.contains_key("VERTFACTOR"));

    decode(&DecodeArgs{ out:Some(dir.join("gx_pretty.json")), cfl:false, pretty:true, ..base.clone() }).unwrap();
    let pretty = fs::read_to_string(dir.join("gx_pretty.json")).unwrap();
    assert!(pretty.lines().count() > 1);
    assert_eq!(Headfile::from_json(&pretty).unwrap(),meta);

    assert!(decode(&DecodeArgs{ out:None, ..base }).is_err());
}

#[test]
fn meta_file_to_json() {
    let dir = utils::scratch_dir("cli_meta").unwrap();
    fs::write(dir.join("params.txt"),"TR = 2000\n").unwrap();
    meta(&MetaArgs{ file:dir.join("params.txt"), out:Some(dir.join("params.json")), pretty:false }).unwrap();
    assert_eq!(fs::read_to_string(dir.join("params.json")).unwrap(),"{\"TR\": 2000}\n");
}

#[test]
fn inf_to_json() {
    let dir = utils::scratch_dir("cli_inf").unwrap();
    fs::write(dir.join("sim_INF.dsv"),INF).unwrap();
    inf(&InfArgs{ inf:dir.join("sim_INF.dsv"), out:Some(dir.join("inf.json")) }).unwrap();
    let blocks = dsv::inf::load_blocks(&dir.join("inf.json")).unwrap();
    assert_eq!(blocks,dsv::inf::read_inf(&dir.join("sim_INF.dsv")).unwrap());
    assert_eq!(blocks[0].adcs[0].samples,Some(4));
}

#[test]
fn normalize_with_overrides() {
    let args = NormalizeArgs{ fov:0.256, gx_unit:None, dt_unit:None, gamma:None, nuclide:None, config:None };
    assert!((normalize(&args).unwrap() - 0.01090048).abs() < 1E-12);
    let args = NormalizeArgs{ gamma:Some(1E6), ..args };
    assert!((normalize(&args).unwrap() - 0.256E-3).abs() < 1E-15);
    let args = NormalizeArgs{ fov:0.0, ..args };
    assert!(normalize(&args).is_err());
}

#[test]
fn new_config_is_loadable() {
    let dir = utils::scratch_dir("cli_config").unwrap();
    new_config(&NewConfigArgs{ path:dir.join("trj") }).unwrap();
    let args = NormalizeArgs{ fov:0.256, gx_unit:None, dt_unit:None, gamma:None, nuclide:None, config:Some(dir.join("trj.toml")) };
    assert!((normalize(&args).unwrap() - 0.01090048).abs() < 1E-12);
}
