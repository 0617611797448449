use std::fmt;
use std::path::Path;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use crate::error::{HeadfileError, HeadfileResult};
use crate::json;
use crate::value::Value;

/// Ordered key/value metadata. Keys are unique and keep the position of their first insertion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headfile {
    entries: Vec<(String,Value)>
}

impl Headfile {

    pub fn new() -> Self {
        Self::default()
    }

    /// parse a key=value text file. Unrecognized lines are skipped, only an unreadable file is an error.
    pub fn from_file(file_path:&Path) -> HeadfileResult<Self> {
        let s = utils::read_latin1(file_path).map_err(|source| HeadfileError::Format {
            path: file_path.to_owned(),
            source,
        })?;
        let h = Self::txt_to_headfile(&s);
        debug!("read {} entries from {:?}",h.len(),file_path);
        Ok(h)
    }

    pub fn txt_to_headfile(headfile_str:&str) -> Self {
        let mut hf = Headfile::new();
        headfile_str.lines().for_each(|line|{
            let line = line.trim();
            if line.starts_with('#') || line.starts_with(';') {
                return;
            }
            // split on the first = we find
            if let Some((key,val)) = line.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    hf.insert(key,Value::coerce(val));
                }
            }
        });
        hf
    }

    pub fn to_txt(&self) -> String {
        let mut strbuf = String::new();
        for (key, val) in self.iter() {
            strbuf.push_str(key);
            strbuf.push('=');
            strbuf.push_str(&val.to_string());
            strbuf.push('\n');
        }
        strbuf
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self,key:&str) -> Option<&Value> {
        self.entries.iter().find(|(k,_)| k == key).map(|(_,v)| v)
    }

    pub fn contains_key(&self,key:&str) -> bool {
        self.get(key).is_some()
    }

    /// insert or replace a value, returning the old one. A replaced key keeps its position.
    pub fn insert<K,V>(&mut self,key:K,value:V) -> Option<Value>
    where K:Into<String>, V:Into<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k,_)| *k == key) {
            Some((_,old)) => Some(std::mem::replace(old,value)),
            None => {
                self.entries.push((key,value));
                None
            }
        }
    }

    pub fn remove(&mut self,key:&str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k,_)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// append all entries of other, overwriting values of keys that already exist
    pub fn merge(&mut self,other:&Headfile) {
        for (k,v) in other.iter() {
            self.insert(k,v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str,&Value)> {
        self.entries.iter().map(|(k,v)| (k.as_str(),v))
    }

    pub fn keys(&self) -> impl Iterator<Item=&str> {
        self.entries.iter().map(|(k,_)| k.as_str())
    }

    /// single-line JSON, e.g. `{"TR": 2000}`
    pub fn to_json(&self) -> HeadfileResult<String> {
        Ok(json::to_string_spaced(self)?)
    }

    pub fn to_json_pretty(&self) -> HeadfileResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s:&str) -> HeadfileResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// write JSON to a file. Nothing is left behind if writing fails.
    pub fn to_json_file(&self,file_path:&Path,pretty:bool) -> HeadfileResult<()> {
        let mut s = match pretty {
            true => self.to_json_pretty()?,
            false => self.to_json()?,
        };
        s.push('\n');
        utils::write_atomic(file_path,s.as_bytes()).map_err(|source| HeadfileError::Io {
            path: file_path.to_owned(),
            source,
        })
    }
}

impl<K,V> FromIterator<(K,V)> for Headfile
where K:Into<String>, V:Into<Value> {
    fn from_iter<I: IntoIterator<Item=(K,V)>>(iter: I) -> Self {
        let mut h = Headfile::new();
        for (k,v) in iter {
            h.insert(k,v);
        }
        h
    }
}

impl Serialize for Headfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k,v) in &self.entries {
            map.serialize_entry(k,v)?;
        }
        map.end()
    }
}

struct HeadfileVisitor;

impl<'de> Visitor<'de> for HeadfileVisitor {
    type Value = Headfile;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of metadata values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headfile, A::Error> {
        let mut h = Headfile::new();
        while let Some((k,v)) = access.next_entry::<String,crate::value::Value>()? {
            h.insert(k,v);
        }
        Ok(h)
    }
}

impl<'de> Deserialize<'de> for Headfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeadfileVisitor)
    }
}

#[cfg(test)]
mod tests {
use super::*;

#[test]
fn tr_line_becomes_number() {
    let h = Headfile::txt_to_headfile("TR = 2000\n");
    assert_eq!(h.get("TR"),Some(&Value::Int(2000)));
    assert_eq!(h.to_json().unwrap(),r#"{"TR": 2000}"#);
}

#[test]
fn huge_exponent_survives_json() {
    let h = Headfile::txt_to_headfile("X = 1e999\n");
    let json = h.to_json().unwrap();
    assert_eq!(json,r#"{"X": "1e999"}"#);
    assert_eq!(Headfile::from_json(&json).unwrap(),h);
}

#[test]
fn keeps_source_order() {
    let h = Headfile::txt_to_headfile("zeta=1\nalpha=2.5\nmid=hello world\n");
    let keys:Vec<&str> = h.keys().collect();
    assert_eq!(keys,vec!["zeta","alpha","mid"]);
    assert_eq!(h.to_json().unwrap(),r#"{"zeta": 1, "alpha": 2.5, "mid": "hello world"}"#);
}

#[test]
fn skips_unrecognized_lines() {
    let h = Headfile::txt_to_headfile("[SECTION]\n# comment=1\n; also=2\n\n=orphan\nno equals here\nFOV=0.256\n");
    assert_eq!(h.len(),1);
    assert_eq!(h.get("FOV"),Some(&Value::Float(0.256)));
}

#[test]
fn splits_on_first_equals() {
    let h = Headfile::txt_to_headfile("expr=a=b\n");
    assert_eq!(h.get("expr"),Some(&Value::from("a=b")));
}

#[test]
fn repeated_key_replaces_in_place() {
    let h = Headfile::txt_to_headfile("a=1\nb=2\na=3\n");
    let keys:Vec<&str> = h.keys().collect();
    assert_eq!(keys,vec!["a","b"]);
    assert_eq!(h.get("a"),Some(&Value::Int(3)));
}

#[test]
fn json_round_trip_keeps_order_and_types() {
    let h:Headfile = vec![("b",Value::Int(1)),("a",Value::Float(0.5)),("c",Value::from("x"))].into_iter().collect();
    let back = Headfile::from_json(&h.to_json_pretty().unwrap()).unwrap();
    assert_eq!(back,h);
}

#[test]
fn missing_file_is_format_error() {
    let dir = utils::scratch_dir("headfile_missing").unwrap();
    match Headfile::from_file(&dir.join("nope.inf")) {
        Err(HeadfileError::Format{..}) => {},
        other => panic!("expected format error, got {:?}",other),
    }
}

#[test]
fn json_file_written() {
    let dir = utils::scratch_dir("headfile_json").unwrap();
    let src = dir.join("meta.inf");
    std::fs::write(&src,"TR = 2000\nTE = 4.5\nname = gre\n").unwrap();
    let h = Headfile::from_file(&src).unwrap();
    let out = dir.join("meta.json");
    h.to_json_file(&out,false).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(),"{\"TR\": 2000, \"TE\": 4.5, \"name\": \"gre\"}\n");
}

#[test]
fn txt_round_trip() {
    let h = Headfile::txt_to_headfile("a=1\nb=2.5\nc=text\n");
    assert_eq!(Headfile::txt_to_headfile(&h.to_txt()),h);
}

}
