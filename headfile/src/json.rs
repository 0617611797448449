use std::io;
use serde::Serialize;
use serde_json::ser::Formatter;

/// single-line JSON with a space after `:` and `,` (`{"TR": 2000, "TE": 5.5}`)
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where W: ?Sized + io::Write {
        match first {
            true => Ok(()),
            false => writer.write_all(b", "),
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where W: ?Sized + io::Write {
        match first {
            true => Ok(()),
            false => writer.write_all(b", "),
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where W: ?Sized + io::Write {
        writer.write_all(b": ")
    }
}

pub fn to_string_spaced<T>(value:&T) -> Result<String,serde_json::Error>
where T: ?Sized + Serialize {
    let mut buf = Vec::<u8>::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}
