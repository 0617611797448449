use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single metadata value. Numeric-looking text is kept as a number so JSON output carries the type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

fn int_regex() -> &'static Regex {
    static RE:OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").expect("invalid regex"))
}

fn float_regex() -> &'static Regex {
    static RE:OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$").expect("invalid regex"))
}

impl Value {

    /// interpret raw text from a metadata file. Surrounding whitespace is ignored.
    pub fn coerce(raw:&str) -> Value {
        let s = raw.trim();
        if int_regex().is_match(s) {
            if let Ok(i) = s.parse::<i64>() {
                return Value::Int(i);
            }
        }
        // i64 overflow lands here as well
        if float_regex().is_match(s) {
            // 1e999 parses to infinity, which json cannot carry
            if let Ok(f) = s.parse::<f64>() {
                if f.is_finite() {
                    return Value::Float(f);
                }
            }
        }
        Value::Text(s.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self,Value::Text(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f,"{}",i),
            Value::Float(x) => write!(f,"{}",x),
            Value::Text(s) => write!(f,"{}",s),
        }
    }
}

impl From<i64> for Value {
    fn from(i:i64) -> Self { Value::Int(i) }
}

impl From<usize> for Value {
    fn from(i:usize) -> Self {
        match i64::try_from(i) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(i as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(x:f64) -> Self { Value::Float(x) }
}

impl From<&str> for Value {
    fn from(s:&str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s:String) -> Self { Value::Text(s) }
}

#[cfg(test)]
mod tests {
use super::*;

#[test]
fn integers() {
    assert_eq!(Value::coerce("2000"),Value::Int(2000));
    assert_eq!(Value::coerce(" -12 "),Value::Int(-12));
    assert_eq!(Value::coerce("+7"),Value::Int(7));
}

#[test]
fn floats() {
    assert_eq!(Value::coerce("2.5"),Value::Float(2.5));
    assert_eq!(Value::coerce("-0.125"),Value::Float(-0.125));
    assert_eq!(Value::coerce("1e-3"),Value::Float(1e-3));
    assert_eq!(Value::coerce(".5"),Value::Float(0.5));
    // too large for i64 but still a number
    assert_eq!(Value::coerce("92233720368547758070"),Value::Float(92233720368547758070.0));
}

#[test]
fn text_stays_text() {
    assert_eq!(Value::coerce("mT/m"),Value::Text("mT/m".to_string()));
    assert_eq!(Value::coerce("inf"),Value::Text("inf".to_string()));
    assert_eq!(Value::coerce("NaN"),Value::Text("NaN".to_string()));
    assert_eq!(Value::coerce("1.2.3"),Value::Text("1.2.3".to_string()));
    assert_eq!(Value::coerce(""),Value::Text(String::new()));
}

#[test]
fn out_of_range_float_stays_text() {
    assert_eq!(Value::coerce("1e999"),Value::Text("1e999".to_string()));
    assert_eq!(Value::coerce("-1e999"),Value::Text("-1e999".to_string()));
    assert_eq!(Value::coerce("1e-999"),Value::Float(0.0));
}

#[test]
fn json_keeps_type() {
    assert_eq!(serde_json::to_string(&Value::Int(3)).unwrap(),"3");
    assert_eq!(serde_json::to_string(&Value::Float(3.0)).unwrap(),"3.0");
    assert_eq!(serde_json::to_string(&Value::from("x")).unwrap(),"\"x\"");
    let v:Value = serde_json::from_str("3").unwrap();
    assert_eq!(v,Value::Int(3));
    let v:Value = serde_json::from_str("3.25").unwrap();
    assert_eq!(v,Value::Float(3.25));
}

}
