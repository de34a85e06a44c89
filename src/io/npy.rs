//! NPY container for 2-D float64 arrays.
//!
//! Layout (format version 1.0):
//! - magic `\x93NUMPY`, version bytes `1 0`
//! - little-endian `u16` header length
//! - ASCII dict header `{'descr': '<f8', 'fortran_order': False, 'shape': (r, c), }`
//!   space-padded and newline-terminated so the data starts on a 64-byte boundary
//! - `r * c` little-endian `f64` values, row-major
//!
//! Writes go to a sibling temp file that is renamed into place, so an
//! interrupted run never leaves a truncated array behind.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;
const PREAMBLE_V1: usize = 10;

/// A decoded 2-D array.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl NpyArray {
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }
}

/// Encode a row-major `rows x cols` array.
pub fn encode(rows: usize, cols: usize, values: &[f64]) -> Result<Vec<u8>, AppError> {
    if values.len() != rows * cols {
        return Err(AppError::shape(format!(
            "Cannot encode {} values as a ({rows}, {cols}) array.",
            values.len()
        )));
    }

    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    let unpadded = PREAMBLE_V1 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;
    let header_len_u16 = u16::try_from(header_len)
        .map_err(|_| AppError::shape(format!("NPY header too long ({header_len} bytes).")))?;

    let mut out = Vec::with_capacity(PREAMBLE_V1 + header_len + values.len() * 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&header_len_u16.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat_n(b' ', padding));
    out.push(b'\n');
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

/// Decode an NPY byte buffer holding a 2-D little-endian float64 array.
pub fn decode(bytes: &[u8]) -> Result<NpyArray, String> {
    if bytes.len() < PREAMBLE_V1 || &bytes[..6] != MAGIC {
        return Err("not an NPY file (bad magic)".to_string());
    }
    let (header_start, header_len) = match bytes[6] {
        1 => (PREAMBLE_V1, usize::from(u16::from_le_bytes([bytes[8], bytes[9]]))),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated NPY preamble".to_string());
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (12, len as usize)
        }
        v => return Err(format!("unsupported NPY version {v}")),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated NPY header".to_string());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "NPY header is not valid text".to_string())?;
    let (rows, cols) = parse_header(header)?;

    let expected = rows
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(8))
        .ok_or_else(|| format!("shape ({rows}, {cols}) is too large"))?;
    let data = &bytes[data_start..];
    if data.len() != expected {
        return Err(format!(
            "data section has {} bytes, expected {expected} for shape ({rows}, {cols})",
            data.len()
        ));
    }
    let values = data
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    Ok(NpyArray { rows, cols, values })
}

fn parse_header(header: &str) -> Result<(usize, usize), String> {
    if !header.contains("'descr': '<f8'") {
        return Err("only little-endian float64 ('<f8') arrays are supported".to_string());
    }
    if !header.contains("'fortran_order': False") {
        return Err("only row-major (fortran_order False) arrays are supported".to_string());
    }
    let shape = header
        .split_once("'shape': (")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| "NPY header has no shape".to_string())?;
    let dims: Vec<usize> = shape
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|e| format!("bad shape dimension '{s}': {e}")))
        .collect::<Result<_, _>>()?;
    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        other => Err(format!("expected a 2-D array, found {} dimension(s)", other.len())),
    }
}

/// Write an array atomically (temp file + rename).
pub fn write_npy(path: &Path, rows: usize, cols: usize, values: &[f64]) -> Result<(), AppError> {
    let bytes = encode(rows, cols, values)?;
    write_atomic(path, &bytes)
}

pub fn read_npy(path: &Path) -> Result<NpyArray, AppError> {
    let mut file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open array '{}': {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| AppError::io(format!("Failed to read array '{}': {e}", path.display())))?;
    decode(&bytes).map_err(|e| AppError::io(format!("Invalid array file '{}': {e}", path.display())))
}

/// Write `bytes` to `path` via a sibling temp file renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = temp_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        writer.write_all(bytes)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::io(format!("Failed to write '{}': {e}", path.display()))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_aligned_and_self_describing() {
        let bytes = encode(35040, 21, &vec![0.0; 35040 * 21]).unwrap();
        let header_len = usize::from(u16::from_le_bytes([bytes[8], bytes[9]]));
        assert_eq!((PREAMBLE_V1 + header_len) % ALIGNMENT, 0);
        assert_eq!(bytes[PREAMBLE_V1 + header_len - 1], b'\n');

        let header = std::str::from_utf8(&bytes[PREAMBLE_V1..PREAMBLE_V1 + header_len]).unwrap();
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (35040, 21), }"));
        assert_eq!(bytes.len(), PREAMBLE_V1 + header_len + 35040 * 21 * 8);
    }

    #[test]
    fn decode_recovers_shape_and_row_major_values() {
        let values = [1.5, -2.0, 3.25, 4.0, 0.0, 6.5];
        let array = decode(&encode(3, 2, &values).unwrap()).unwrap();
        assert_eq!((array.rows, array.cols), (3, 2));
        assert_eq!(array.row(1), &[3.25, 4.0]);
        assert_eq!(array.values, values);
    }

    #[test]
    fn rejects_mismatched_or_foreign_input() {
        assert!(encode(2, 2, &[1.0]).is_err());
        assert!(decode(b"PK\x03\x04 not npy").is_err());

        let mut truncated = encode(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        truncated.truncate(truncated.len() - 8);
        assert!(decode(&truncated).unwrap_err().contains("expected 32"));
    }

    #[test]
    fn oversized_header_shape_is_an_error() {
        let mut bytes = encode(1, 1, &[1.0]).unwrap();
        let header_len = usize::from(u16::from_le_bytes([bytes[8], bytes[9]]));
        let header = String::from_utf8(bytes[PREAMBLE_V1..PREAMBLE_V1 + header_len].to_vec()).unwrap();
        let huge = format!("({}, {})", usize::MAX, 2);
        let forged = header.replacen("(1, 1)", &huge, 1);
        let forged = format!("{:<width$}", forged.trim_end(), width = header_len - 1) + "\n";
        assert_eq!(forged.len(), header_len);
        bytes.splice(PREAMBLE_V1..PREAMBLE_V1 + header_len, forged.into_bytes());

        assert!(decode(&bytes).unwrap_err().contains("too large"));
    }

    #[test]
    fn atomic_write_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DK1_flow_2025.npy");
        write_npy(&path, 1, 2, &[10.0, 20.0]).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["DK1_flow_2025.npy".to_string()]);
        assert_eq!(read_npy(&path).unwrap().values, vec![10.0, 20.0]);
    }
}
