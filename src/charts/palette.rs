use plotters::style::RGBColor;

/// Sequential palettes used for the bar charts, plus a categorical one for hues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Crest,
    Rocket,
    Mako,
    /// Categorical, cycles after ten colours
    Deep,
}

const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const CREST: &[(u8, u8, u8)] = &[
    (165, 205, 144),
    (79, 163, 149),
    (44, 121, 145),
    (37, 79, 130),
    (41, 37, 89),
];

const ROCKET: &[(u8, u8, u8)] = &[
    (53, 19, 61),
    (120, 28, 75),
    (203, 27, 76),
    (240, 96, 67),
    (246, 180, 143),
];

const MAKO: &[(u8, u8, u8)] = &[
    (41, 29, 58),
    (63, 58, 122),
    (53, 123, 162),
    (66, 178, 169),
    (222, 245, 229),
];

const DEEP: &[(u8, u8, u8)] = &[
    (76, 114, 176),
    (221, 132, 82),
    (85, 168, 104),
    (196, 78, 82),
    (129, 114, 179),
    (147, 120, 96),
    (218, 139, 195),
    (140, 140, 140),
    (204, 185, 116),
    (100, 181, 205),
];

/// Single-colour fills
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);

impl Palette {
    /// Colour for item `i` of `n`. Sequential palettes are sampled evenly
    /// between their end stops; `Deep` cycles.
    pub fn color(self, i: usize, n: usize) -> RGBColor {
        let stops = match self {
            Palette::Viridis => VIRIDIS,
            Palette::Crest => CREST,
            Palette::Rocket => ROCKET,
            Palette::Mako => MAKO,
            Palette::Deep => {
                let (r, g, b) = DEEP[i % DEEP.len()];
                return RGBColor(r, g, b);
            }
        };
        let t = if n <= 1 {
            0.5
        } else {
            i.min(n - 1) as f64 / (n - 1) as f64
        };
        interpolate(stops, t)
    }
}

fn interpolate(stops: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let scaled = t * (stops.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(stops.len() - 1);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (stops[lo], stops[hi]);
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}
