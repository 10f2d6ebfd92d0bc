//! Safetensors I/O for the CLI.
//!
//! Reader: loads a time-major `[T, N]` F32 or F64 series.
//! Writer: stores the lag tensor, connectivity matrix and dominant lags.
use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array2, Array3};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::connectivity::NetEstimate;

// ── Low-level safetensors parser (raw bytes → ndarray, no `safetensors`
//    crate). ─────────────────────────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, Value>, usize)> {
    ensure!(bytes.len() >= 8, "safetensors file too small");
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    let end = 8usize.checked_add(n).filter(|&e| e <= bytes.len())
        .context("safetensors header length exceeds file size")?;
    let header: HashMap<String, Value> = serde_json::from_slice(&bytes[8..end])
        .context("failed to parse safetensors header")?;
    Ok((header, end))
}

fn tensor_bytes<'a>(bytes: &'a [u8], data_start: usize, entry: &Value) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"].as_array().context("missing data_offsets")?;
    ensure!(offsets.len() == 2, "data_offsets must have two elements");
    let s = offsets[0].as_u64().context("bad data offset")? as usize;
    let e = offsets[1].as_u64().context("bad data offset")? as usize;
    ensure!(s <= e, "data_offsets [{s}, {e}] are reversed");
    let start = data_start.checked_add(s).context("tensor data offset overflows")?;
    let end = data_start.checked_add(e).context("tensor data offset overflows")?;
    bytes.get(start..end).context("tensor data out of bounds")
}

fn shape_of(entry: &Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad shape entry"))
        .collect()
}

fn read_float_tensor(bytes: &[u8], data_start: usize, entry: &Value) -> Result<Vec<f64>> {
    let raw = tensor_bytes(bytes, data_start, entry)?;
    match entry["dtype"].as_str() {
        Some("F64") => Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect()),
        Some("F32") => Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect()),
        other => bail!("unsupported dtype {other:?}, expected F32 or F64"),
    }
}

// ── Public structs ────────────────────────────────────────────────────────────

/// A time-major multichannel series loaded from safetensors.
pub struct SeriesData {
    /// [T, N], rows in time order.
    pub data: Array2<f64>,
    /// Channel names (empty if the file has no `ch_names` entry).
    pub ch_names: Vec<String>,
}

impl SeriesData {
    /// Load the 2-D tensor stored under `key`.
    ///
    /// `ch_names`, if present, is newline-separated UTF-8 stored as U8.
    pub fn load(path: &Path, key: &str) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let entry = header.get(key).with_context(|| format!("missing '{key}' key"))?;
        let shape = shape_of(entry)?;
        ensure!(shape.len() == 2, "'{key}' must be 2-D [T, N], got shape {shape:?}");
        let values = read_float_tensor(&bytes, data_start, entry)?;
        let data = Array2::from_shape_vec((shape[0], shape[1]), values)
            .with_context(|| format!("'{key}' data does not match shape {shape:?}"))?;

        let ch_names: Vec<String> = match header.get("ch_names") {
            Some(e) => std::str::from_utf8(tensor_bytes(&bytes, data_start, e)?)?
                .split('\n')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => vec![],
        };

        Ok(SeriesData { data, ch_names })
    }

    /// Display name of channel `idx`: its stored name, or the index.
    pub fn channel_label(&self, idx: usize) -> String {
        self.ch_names.get(idx).cloned().unwrap_or_else(|| idx.to_string())
    }
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Safetensors writer for F64, F32, I32 and U8 tensors.
///
/// Tensors are laid out in insertion order.  F32 is the narrow form
/// [`SeriesData::load`] widens back to F64.
///
/// ```rust,no_run
/// use xcorr_net::io::StWriter;
/// use ndarray::Array2;
/// use std::path::Path;
///
/// let mut w = StWriter::new();
/// w.add_f64_arr2("S", &Array2::zeros((100, 4)));
/// w.write(Path::new("/tmp/series.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    tensors: Vec<StTensor>,
}

struct StTensor {
    name: String,
    dtype: &'static str,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, dtype: &'static str, shape: Vec<usize>, bytes: Vec<u8>) {
        self.tensors.push(StTensor { name: name.to_string(), dtype, shape, bytes });
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F64", shape.to_vec(), bytes);
    }

    /// Row-major `[rows, cols]`.
    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F64", arr.shape().to_vec(), bytes);
    }

    pub fn add_f64_arr3(&mut self, name: &str, arr: &Array3<f64>) {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F64", arr.shape().to_vec(), bytes);
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F32", shape.to_vec(), bytes);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "I32", shape.to_vec(), bytes);
    }

    /// Newline-joined names as a U8 tensor (the layout `SeriesData::load`
    /// reads back).
    pub fn add_names(&mut self, name: &str, names: &[String]) {
        let bytes = names.join("\n").into_bytes();
        let len = bytes.len();
        self.push(name, "U8", vec![len], bytes);
    }

    /// JSON header padded with spaces to a multiple of 8 bytes.
    fn header(&self) -> Result<Vec<u8>> {
        let mut map = serde_json::Map::new();
        let mut offset = 0usize;
        for t in &self.tensors {
            let end = offset + t.bytes.len();
            map.insert(t.name.clone(), serde_json::json!({
                "dtype": t.dtype,
                "shape": t.shape,
                "data_offsets": [offset, end],
            }));
            offset = end;
        }
        let mut header = serde_json::to_vec(&map)?;
        header.resize(header.len().next_multiple_of(8), b' ');
        Ok(header)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let header = self.header()?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut out = std::io::BufWriter::new(file);
        out.write_all(&(header.len() as u64).to_le_bytes())?;
        out.write_all(&header)?;
        for t in &self.tensors {
            out.write_all(&t.bytes)?;
        }
        out.flush()
            .with_context(|| format!("writing {}", path.display()))
    }
}

// ── Estimate writer ───────────────────────────────────────────────────────────

/// Write `est` to `path`.
///
/// Keys: `lag_tensor` [N, N, dt_max] F64, `connectivity` [N, N] F64,
/// `dominant_lag` [N, N] I32.
pub fn write_estimate(est: &NetEstimate, path: &Path) -> Result<()> {
    let lags = est.dominant_lag();
    let lag_data: Vec<i32> = lags
        .iter()
        .map(|&d| i32::try_from(d).context("lag does not fit in i32"))
        .collect::<Result<_>>()?;

    let mut w = StWriter::new();
    w.add_f64_arr3("lag_tensor", &est.lag_tensor);
    w.add_f64_arr2("connectivity", &est.connectivity);
    w.add_i32("dominant_lag", &lag_data, &[lags.nrows(), lags.ncols()]);
    w.write(path)
}
