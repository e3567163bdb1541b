//! PLY format I/O for Gaussian-splat point clouds.
//!
//! Splat training pipelines export one `vertex` element whose scalar
//! properties are the per-point attributes (`x`, `f_dc_0`, `rot_3`, ...).
//! This module reads that element into an [`AttributeTable`] and writes a
//! table back out. Only scalar properties are supported; list properties
//! (face indices and the like) are rejected.

use crate::io::AttributeTable;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or saving PLY data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PLY format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported PLY feature: {0}")]
    Unsupported(String),
}

/// PLY body encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyFormat {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Some(PlyFormat::BinaryBigEndian),
            _ => None,
        }
    }
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
            PlyFormat::BinaryBigEndian => "binary_big_endian",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "char" | "int8" => ScalarType::I8,
            "uchar" | "uint8" => ScalarType::U8,
            "short" | "int16" => ScalarType::I16,
            "ushort" | "uint16" => ScalarType::U16,
            "int" | "int32" => ScalarType::I32,
            "uint" | "uint32" => ScalarType::U32,
            "float" | "float32" => ScalarType::F32,
            "double" | "float64" => ScalarType::F64,
            _ => return None,
        })
    }

    fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Decode one value from the front of `buf`, widened to f32.
    fn decode<B: ByteOrder>(self, buf: &[u8]) -> f32 {
        match self {
            ScalarType::I8 => buf[0] as i8 as f32,
            ScalarType::U8 => buf[0] as f32,
            ScalarType::I16 => B::read_i16(buf) as f32,
            ScalarType::U16 => B::read_u16(buf) as f32,
            ScalarType::I32 => B::read_i32(buf) as f32,
            ScalarType::U32 => B::read_u32(buf) as f32,
            ScalarType::F32 => B::read_f32(buf),
            ScalarType::F64 => B::read_f64(buf) as f32,
        }
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<(String, ScalarType)>,
    has_list: bool,
}

impl Element {
    fn stride(&self) -> usize {
        self.properties.iter().map(|(_, t)| t.size()).sum()
    }
}

#[derive(Debug)]
struct Header {
    format: PlyFormat,
    elements: Vec<Element>,
}

fn invalid(msg: impl Into<String>) -> LoadError {
    LoadError::InvalidFormat(msg.into())
}

/// Read one header line without the trailing newline.
fn read_header_line<R: BufRead>(reader: &mut R) -> Result<String, LoadError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(invalid("unexpected end of file in header"));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header, LoadError> {
    if read_header_line(reader)?.trim() != "ply" {
        return Err(invalid("missing 'ply' magic"));
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();

    loop {
        let line = read_header_line(reader)?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None | Some("comment") | Some("obj_info") => {}
            Some("format") => {
                let name = tokens.next().ok_or_else(|| invalid("format line without encoding"))?;
                format = Some(
                    PlyFormat::parse(name)
                        .ok_or_else(|| LoadError::Unsupported(format!("format '{}'", name)))?,
                );
                if tokens.next() != Some("1.0") {
                    return Err(LoadError::Unsupported(format!("PLY version in '{}'", line)));
                }
            }
            Some("element") => {
                let name = tokens.next().ok_or_else(|| invalid("element without name"))?;
                let count = tokens
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| invalid(format!("bad element count in '{}'", line)))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                    has_list: false,
                });
            }
            Some("property") => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| invalid("property before any element"))?;
                let ty = tokens.next().ok_or_else(|| invalid("property without type"))?;
                if ty == "list" {
                    element.has_list = true;
                    continue;
                }
                let ty_parsed = ScalarType::parse(ty)
                    .ok_or_else(|| invalid(format!("unknown property type '{}'", ty)))?;
                let name = tokens.next().ok_or_else(|| invalid("property without name"))?;
                element.properties.push((name.to_string(), ty_parsed));
            }
            Some("end_header") => break,
            Some(other) => return Err(invalid(format!("unexpected header keyword '{}'", other))),
        }
    }

    let format = format.ok_or_else(|| invalid("missing format line"))?;
    Ok(Header { format, elements })
}

fn map_eof(e: std::io::Error) -> LoadError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        invalid("truncated element data")
    } else {
        LoadError::Io(e)
    }
}

fn skip_element<R: BufRead>(reader: &mut R, format: PlyFormat, element: &Element) -> Result<(), LoadError> {
    if element.has_list {
        return Err(LoadError::Unsupported(format!(
            "list properties in element '{}' preceding 'vertex'",
            element.name
        )));
    }
    match format {
        PlyFormat::Ascii => {
            let mut line = String::new();
            for _ in 0..element.count {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Err(invalid("truncated element data"));
                }
            }
        }
        _ => {
            let bytes = element
                .count
                .checked_mul(element.stride())
                .ok_or_else(|| invalid(format!("element '{}' size overflows", element.name)))?
                as u64;
            let skipped = std::io::copy(&mut (&mut *reader).take(bytes), &mut std::io::sink())?;
            if skipped != bytes {
                return Err(invalid("truncated element data"));
            }
        }
    }
    Ok(())
}

fn read_binary_rows<B: ByteOrder, R: BufRead>(
    reader: &mut R,
    element: &Element,
    columns: &mut [Vec<f32>],
) -> Result<(), LoadError> {
    let mut row = vec![0u8; element.stride()];
    for _ in 0..element.count {
        reader.read_exact(&mut row).map_err(map_eof)?;
        let mut offset = 0;
        for ((_, ty), column) in element.properties.iter().zip(columns.iter_mut()) {
            column.push(ty.decode::<B>(&row[offset..]));
            offset += ty.size();
        }
    }
    Ok(())
}

fn read_ascii_rows<R: BufRead>(
    reader: &mut R,
    element: &Element,
    columns: &mut [Vec<f32>],
) -> Result<(), LoadError> {
    let mut line = String::new();
    for row in 0..element.count {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(invalid("truncated element data"));
        }
        let mut values = line.split_whitespace();
        for column in columns.iter_mut() {
            let token = values
                .next()
                .ok_or_else(|| invalid(format!("row {} has too few values", row)))?;
            let value: f64 = token
                .parse()
                .map_err(|_| invalid(format!("row {}: cannot parse '{}'", row, token)))?;
            column.push(value as f32);
        }
        if values.next().is_some() {
            return Err(invalid(format!("row {} has too many values", row)));
        }
    }
    Ok(())
}

/// Read the `vertex` element of a PLY stream into an attribute table.
pub fn read_ply<R: BufRead>(mut reader: R) -> Result<AttributeTable, LoadError> {
    let header = parse_header(&mut reader)?;

    let vertex_idx = header
        .elements
        .iter()
        .position(|e| e.name == "vertex")
        .ok_or_else(|| invalid("no 'vertex' element"))?;

    for element in &header.elements[..vertex_idx] {
        skip_element(&mut reader, header.format, element)?;
    }

    let vertex = &header.elements[vertex_idx];
    if vertex.has_list {
        return Err(LoadError::Unsupported(
            "list properties in 'vertex' element".to_string(),
        ));
    }

    // Cap the up-front reservation; a bogus count should fail on EOF, not OOM.
    let reserve = vertex.count.min(1 << 20);
    let mut columns: Vec<Vec<f32>> = vertex
        .properties
        .iter()
        .map(|_| Vec::with_capacity(reserve))
        .collect();

    match header.format {
        PlyFormat::Ascii => read_ascii_rows(&mut reader, vertex, &mut columns)?,
        PlyFormat::BinaryLittleEndian => {
            read_binary_rows::<LittleEndian, _>(&mut reader, vertex, &mut columns)?
        }
        PlyFormat::BinaryBigEndian => {
            read_binary_rows::<BigEndian, _>(&mut reader, vertex, &mut columns)?
        }
    }

    let mut table = AttributeTable::new();
    for ((name, _), values) in vertex.properties.iter().zip(columns) {
        table.insert(name.clone(), values);
    }
    Ok(table)
}

/// Load the `vertex` element of a PLY file.
pub fn load_ply(path: &Path) -> Result<AttributeTable, LoadError> {
    let file = File::open(path)?;
    let table = read_ply(BufReader::new(file))?;
    tracing::info!(
        "Loaded {} points with {} attributes from {:?}",
        table.row_count().unwrap_or(0),
        table.num_columns(),
        path
    );
    Ok(table)
}

/// Write every column of `table` as a float property of a `vertex` element.
pub fn write_ply<W: Write>(mut writer: W, table: &AttributeTable, format: PlyFormat) -> Result<(), LoadError> {
    let rows = table
        .row_count()
        .ok_or_else(|| invalid("columns have different lengths"))?;
    let columns: Vec<&[f32]> = table.columns().map(|(_, v)| v).collect();

    // Write PLY header
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", format)?;
    writeln!(writer, "element vertex {}", rows)?;
    for name in table.names() {
        writeln!(writer, "property float {}", name)?;
    }
    writeln!(writer, "end_header")?;

    // Write vertex data
    for row in 0..rows {
        match format {
            PlyFormat::Ascii => {
                let line: Vec<String> = columns.iter().map(|c| c[row].to_string()).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
            PlyFormat::BinaryLittleEndian => {
                for c in &columns {
                    writer.write_f32::<LittleEndian>(c[row])?;
                }
            }
            PlyFormat::BinaryBigEndian => {
                for c in &columns {
                    writer.write_f32::<BigEndian>(c[row])?;
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Save a table to a PLY file.
pub fn save_ply(table: &AttributeTable, path: &Path, format: PlyFormat) -> Result<(), LoadError> {
    let file = File::create(path)?;
    write_ply(BufWriter::new(file), table, format)
}
