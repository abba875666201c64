//! Named color scales
//!
//! Static catalog of palette names and their ordered color stops. The stops
//! approximate the plotly color scales of the same name and are used both by
//! the terminal heatmap renderer and the HTML exporter.

/// Palette selected when nothing else is configured
pub const DEFAULT_PALETTE: &str = "Viridis";

/// Gradient returned for names that are not in the catalog
pub const NEUTRAL_STOPS: &[&str] = &["#999999", "#eeeeee"];

const CATALOG: &[(&str, &[&str])] = &[
    ("Viridis", &["#440154", "#3b528b", "#21918c", "#5ec962", "#fde725"]),
    ("Cividis", &["#00224e", "#2c4f6b", "#576d6d", "#8a8f65", "#d7c77a"]),
    ("Plasma", &["#0d0887", "#6a00a8", "#b12a90", "#e16462", "#fca636", "#f0f921"]),
    (
        "Inferno",
        &["#000004", "#1f0c48", "#550f6d", "#88226a", "#b63655", "#e35933", "#fcffa4"],
    ),
    (
        "Magma",
        &[
            "#000004", "#1c1044", "#4f127b", "#812581", "#b5367a", "#e55964", "#fb8761", "#feca8d",
            "#fbfdbf",
        ],
    ),
    (
        "Turbo",
        &["#30123b", "#4145ab", "#2db7d5", "#41f1b6", "#e9fe6e", "#f9a31a", "#c71b1e"],
    ),
    ("Portland", &["#0d0887", "#6a00a8", "#b12a90", "#e16462", "#fca636"]),
    ("Jet", &["#00007F", "#0000FF", "#00FFFF", "#FFFF00", "#FF0000", "#7F0000"]),
    ("Greys", &["#000000", "#444444", "#888888", "#bbbbbb", "#eeeeee", "#ffffff"]),
    ("YlGnBu", &["#ffffcc", "#a1dab4", "#41b6c4", "#2c7fb8", "#253494"]),
    ("YlOrRd", &["#ffffb2", "#fecc5c", "#fd8d3c", "#f03b20", "#bd0026"]),
    ("Blues", &["#f7fbff", "#c6dbef", "#6baed6", "#3182bd", "#08519c"]),
    ("Greens", &["#f7fcf5", "#c7e9c0", "#74c476", "#31a354", "#006d2c"]),
    ("Reds", &["#fff5f0", "#fcbba1", "#fb6a4a", "#de2d26", "#a50f15"]),
    ("Picnic", &["#0000ff", "#00ffff", "#ffff00", "#ff0000"]),
    (
        "Rainbow",
        &["#9400D3", "#4B0082", "#0000FF", "#00FF00", "#FFFF00", "#FF7F00", "#FF0000"],
    ),
    ("Earth", &["#0000a7", "#00a0a7", "#00a700", "#a7a700", "#a75400", "#a70000"]),
    ("Electric", &["#000000", "#2a3bd7", "#ff2b2b", "#ffff00", "#ffffff"]),
    ("Blackbody", &["#000000", "#780000", "#e63200", "#ffff00", "#ffffff"]),
    (
        "Cubehelix",
        &[
            "#000000", "#3f2b64", "#594c86", "#6f7aa6", "#81a9bf", "#98d3c9", "#c2f0b8", "#f5fbb4",
        ],
    ),
];

const NAMES: &[&str] = &[
    "Viridis", "Cividis", "Plasma", "Inferno", "Magma", "Turbo", "Portland", "Jet", "Greys",
    "YlGnBu", "YlOrRd", "Blues", "Greens", "Reds", "Picnic", "Rainbow", "Earth", "Electric",
    "Blackbody", "Cubehelix",
];

/// Ordered color stops for a palette name, or [`NEUTRAL_STOPS`] if unknown
pub fn colors_for(name: &str) -> &'static [&'static str] {
    CATALOG
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, stops)| *stops)
        .unwrap_or(NEUTRAL_STOPS)
}

/// All palette names in catalog order
pub fn all_names() -> &'static [&'static str] {
    NAMES
}

/// Whether a name is part of the catalog
pub fn is_known(name: &str) -> bool {
    CATALOG.iter().any(|(n, _)| *n == name)
}

/// An RGB color triple
pub type Rgb = (u8, u8, u8);

/// A resolved palette: parsed stops ready for interpolation
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: String,
    stops: Vec<Rgb>,
}

impl Palette {
    /// Resolve a palette by name. Unknown names resolve to the neutral gradient.
    pub fn named(name: &str) -> Self {
        let stops = colors_for(name)
            .iter()
            .filter_map(|hex| parse_hex(hex))
            .collect::<Vec<_>>();
        Self {
            name: name.to_string(),
            stops,
        }
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Interpolated color at `t` in [0, 1]; values outside are clamped, NaN maps to 0
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self.stops.len() {
            0 => (0, 0, 0),
            1 => self.stops[0],
            n => {
                let scaled = t * (n - 1) as f64;
                let lo = (scaled.floor() as usize).min(n - 2);
                let frac = scaled - lo as f64;
                lerp(self.stops[lo], self.stops[lo + 1], frac)
            }
        }
    }

    /// Stops as `(position, "#rrggbb")` pairs evenly spaced over [0, 1]
    pub fn positioned_stops(&self) -> Vec<(f64, String)> {
        let n = self.stops.len();
        self.stops
            .iter()
            .enumerate()
            .map(|(i, &(r, g, b))| {
                let pos = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
                (pos, format!("#{:02x}{:02x}{:02x}", r, g, b))
            })
            .collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::named(DEFAULT_PALETTE)
    }
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Parse `#rgb` or `#rrggbb` (case-insensitive)
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        6 => Some((
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let expand = |s: &str| channel(s).map(|v| v * 17);
            Some((
                expand(&digits[0..1])?,
                expand(&digits[1..2])?,
                expand(&digits[2..3])?,
            ))
        }
        _ => None,
    }
}
