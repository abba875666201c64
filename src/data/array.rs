//! Loaded array payloads
//!
//! Decodes the nested JSON produced by `numpy.ndarray.tolist()` into an
//! n-dimensional array and extracts the 2-D slices shown by heatmap tiles.

use ndarray::{Array2, ArrayD, Axis, Ix2, IxDyn};
use serde::Deserialize;
use serde_json::Value;

use super::errors::DecodeError;

/// Entry of the backend file listing
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileDescriptor {
    pub filename: String,
    pub shape: Vec<usize>,
    /// File size in megabytes, when the backend reports it
    #[serde(default)]
    pub size_mb: Option<f64>,
}

impl FileDescriptor {
    /// Length of the leading dimension, or 0 for scalars
    pub fn leading_len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn shape_label(&self) -> String {
        let dims = self
            .shape
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("×");
        format!("[{}]", dims)
    }
}

/// A fully decoded array file, owned by the cache
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedArray {
    pub filename: String,
    pub data: ArrayD<f64>,
    pub shape: Vec<usize>,
    pub min: f64,
    pub max: f64,
}

impl LoadedArray {
    /// Build from a nested JSON value that must agree with `shape` element for element.
    ///
    /// Numbers decode as-is, booleans as 0/1 and `null` as NaN (a gap in the heatmap).
    pub fn from_nested(
        filename: &str,
        nested: &Value,
        shape: Vec<usize>,
        min: f64,
        max: f64,
    ) -> Result<Self, DecodeError> {
        let mut flat = Vec::new();
        flatten_into(nested, &shape, &shape, &mut flat)?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| {
            DecodeError::ShapeMismatch {
                shape: shape.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            filename: filename.to_string(),
            data,
            shape,
            min,
            max,
        })
    }

    /// The 2-D grid displayed for `leading_index`.
    ///
    /// 2-D arrays are returned whole; arrays with three or more dimensions are
    /// indexed along the leading axis, and any remaining extra axes are pinned
    /// to 0 until two axes are left. Lower-dimensional arrays have no grid.
    pub fn slice2d(&self, leading_index: usize) -> Option<Array2<f64>> {
        match self.data.ndim() {
            0 | 1 => None,
            2 => self
                .data
                .view()
                .into_dimensionality::<Ix2>()
                .ok()
                .map(|v| v.to_owned()),
            _ => {
                if leading_index >= self.data.len_of(Axis(0)) {
                    return None;
                }
                let mut view = self.data.index_axis(Axis(0), leading_index);
                while view.ndim() > 2 {
                    if view.len_of(Axis(0)) == 0 {
                        return None;
                    }
                    view = view.index_axis_move(Axis(0), 0);
                }
                view.into_dimensionality::<Ix2>().ok().map(|v| v.to_owned())
            }
        }
    }
}

fn flatten_into(
    value: &Value,
    full_shape: &[usize],
    shape: &[usize],
    out: &mut Vec<f64>,
) -> Result<(), DecodeError> {
    match shape.split_first() {
        None => {
            let v = match value {
                Value::Number(n) => n.as_f64().ok_or(DecodeError::NonNumeric(out.len()))?,
                Value::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                Value::Null => f64::NAN,
                _ => return Err(DecodeError::NonNumeric(out.len())),
            };
            out.push(v);
            Ok(())
        }
        Some((&len, rest)) => {
            let items = value.as_array().ok_or_else(|| DecodeError::ShapeMismatch {
                shape: full_shape.to_vec(),
                reason: format!("expected a list at depth {}", full_shape.len() - shape.len()),
            })?;
            if items.len() != len {
                return Err(DecodeError::ShapeMismatch {
                    shape: full_shape.to_vec(),
                    reason: format!(
                        "axis {} has {} entries, expected {}",
                        full_shape.len() - shape.len(),
                        items.len(),
                        len
                    ),
                });
            }
            for item in items {
                flatten_into(item, full_shape, rest, out)?;
            }
            Ok(())
        }
    }
}
