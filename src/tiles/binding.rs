//! Heatmap slices bound to tiles
//!
//! A binding is derived from the cache and the catalog selection. It is
//! never merged: every recompute replaces the previous binding wholesale.

use ndarray::Array2;
use ndarray_stats::QuantileExt;

use crate::data::LoadedArray;
use crate::mosaic::TileId;

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapBinding {
    pub z: Array2<f64>,
    pub filename: String,
    pub leading_index: usize,
    /// Bounds of the whole file, so slices share one color scale
    pub min: f64,
    pub max: f64,
}

impl HeatmapBinding {
    /// `(rows, columns)` of the grid
    pub fn dims(&self) -> (usize, usize) {
        self.z.dim()
    }

    pub fn title(&self) -> String {
        format!("{} [{}]", self.filename, self.leading_index)
    }

    /// Color bounds, or `None` when the file reported non-finite ones
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.min.is_finite() && self.max.is_finite() {
            Some((self.min, self.max))
        } else {
            None
        }
    }

    /// Extent of the slice itself, ignoring NaN gaps
    pub fn slice_range(&self) -> Option<(f64, f64)> {
        if self.z.is_empty() {
            return None;
        }
        let lo = *self.z.min_skipnan();
        let hi = *self.z.max_skipnan();
        if lo.is_nan() || hi.is_nan() {
            return None;
        }
        Some((lo, hi))
    }
}

/// Slice `array` at `leading_index` into a binding; `None` for arrays below two dimensions
pub fn derive_binding(array: &LoadedArray, leading_index: usize) -> Option<HeatmapBinding> {
    let z = array.slice2d(leading_index)?;
    Some(HeatmapBinding {
        z,
        filename: array.filename.clone(),
        leading_index,
        min: array.min,
        max: array.max,
    })
}

/// Inputs a binding is derived from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingKey {
    pub tile: TileId,
    pub filename: String,
    pub leading_index: usize,
    /// Number of cached files, so a completed load triggers a recompute
    pub cached: usize,
}

/// Remembers the last inputs so bindings are only recomputed on change
#[derive(Debug, Default)]
pub struct BindingTracker {
    last: Option<BindingKey>,
}

impl BindingTracker {
    /// True when `key` differs from the previously seen inputs
    pub fn changed(&mut self, key: BindingKey) -> bool {
        if self.last.as_ref() == Some(&key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn cube() -> LoadedArray {
        let data = json!([
            [[0, 1, 2, 3], [4, 5, 6, 7], [8, 9, 10, 11], [12, 13, 14, 15]],
            [[16, 17, 18, 19], [20, 21, 22, 23], [24, 25, 26, 27], [28, 29, 30, 31]],
            [[32, 33, 34, 35], [36, 37, 38, 39], [40, 41, 42, 43], [44, 45, 46, 47]]
        ]);
        LoadedArray::from_nested("a.npy", &data, vec![3, 4, 4], 0.0, 47.0).unwrap()
    }

    #[test]
    fn test_binding_takes_leading_slice() {
        let binding = derive_binding(&cube(), 1).unwrap();
        assert_eq!(binding.leading_index, 1);
        assert_eq!(binding.filename, "a.npy");
        assert_eq!(
            binding.z,
            array![
                [16., 17., 18., 19.],
                [20., 21., 22., 23.],
                [24., 25., 26., 27.],
                [28., 29., 30., 31.]
            ]
        );
        assert_eq!(binding.bounds(), Some((0.0, 47.0)));
        assert_eq!(binding.slice_range(), Some((16.0, 31.0)));
        assert_eq!(binding.title(), "a.npy [1]");
    }

    #[test]
    fn test_two_dimensional_and_vector() {
        let grid = LoadedArray::from_nested("g.npy", &json!([[1, 2], [3, 4]]), vec![2, 2], 1.0, 4.0)
            .unwrap();
        assert_eq!(derive_binding(&grid, 1).unwrap().z, array![[1., 2.], [3., 4.]]);

        let vector = LoadedArray::from_nested("v.npy", &json!([1, 2]), vec![2], 1.0, 2.0).unwrap();
        assert!(derive_binding(&vector, 0).is_none());
    }

    #[test]
    fn test_slice_range_skips_nan() {
        let grid = LoadedArray::from_nested(
            "n.npy",
            &json!([[null, 2], [3, null]]),
            vec![2, 2],
            f64::NAN,
            f64::NAN,
        )
        .unwrap();
        let binding = derive_binding(&grid, 0).unwrap();
        assert_eq!(binding.slice_range(), Some((2.0, 3.0)));
        assert_eq!(binding.bounds(), None);
    }

    #[test]
    fn test_tracker_only_fires_on_change() {
        let mut tracker = BindingTracker::default();
        let key = BindingKey {
            tile: "a".into(),
            filename: "a.npy".into(),
            leading_index: 0,
            cached: 1,
        };
        assert!(tracker.changed(key.clone()));
        assert!(!tracker.changed(key.clone()));
        assert!(tracker.changed(BindingKey {
            leading_index: 2,
            ..key.clone()
        }));
        tracker.reset();
        assert!(tracker.changed(BindingKey {
            leading_index: 2,
            ..key
        }));
    }
}
