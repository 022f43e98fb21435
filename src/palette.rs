//! Symbol → color lookup.

use serde::Serialize;

use crate::config::{LayoutConfig, PaletteKind};

pub type Rgb = [u8; 3];

/// Alignment gap.
pub const GAP_CHAR: u8 = b'-';

/// Unmapped symbols are painted red so they stand out.
pub const FALLBACK_COLOR: Rgb = [255, 0, 0];

const NUCLEOTIDE_LEGEND: [(&str, u8); 5] = [
    ("Adenine (A)", b'A'),
    ("Thymine (T)", b'T'),
    ("Guanine (G)", b'G'),
    ("Cytosine (C)", b'C'),
    ("Unsequenced", b'N'),
];

const PROTEIN_LEGEND: [(&str, u8); 21] = [
    ("Alanine (A)", b'A'),
    ("Cysteine (C)", b'C'),
    ("Aspartic acid (D)", b'D'),
    ("Glutamic acid (E)", b'E'),
    ("Phenylalanine (F)", b'F'),
    ("Glycine (G)", b'G'),
    ("Histidine (H)", b'H'),
    ("Isoleucine (I)", b'I'),
    ("Lysine (K)", b'K'),
    ("Leucine (L)", b'L'),
    ("Methionine (M)", b'M'),
    ("Asparagine (N)", b'N'),
    ("Proline (P)", b'P'),
    ("Glutamine (Q)", b'Q'),
    ("Arginine (R)", b'R'),
    ("Serine (S)", b'S'),
    ("Threonine (T)", b'T'),
    ("Valine (V)", b'V'),
    ("Tryptophan (W)", b'W'),
    ("Tyrosine (Y)", b'Y'),
    ("Any (X)", b'X'),
];

const SPECTRUM_LEGEND: [(&str, u8); 3] = [("Low (0)", 0), ("Middle (125)", 125), ("High (255)", 255)];

/// Rasmol-derived amino acid colors.
const RASMOL: [(u8, u32); 17] = [
    (b'D', 0xEA3535),
    (b'E', 0xEA3535),
    (b'F', 0x4B4BB5),
    (b'H', 0x9595D9),
    (b'I', 0x2F932F),
    (b'K', 0x3C76FF),
    (b'L', 0x2F932F),
    (b'M', 0xECEC41),
    (b'N', 0x3BE4E4),
    (b'P', 0xE25826),
    (b'Q', 0x3BE4E4),
    (b'R', 0x3C76FF),
    (b'S', 0xFBAC34),
    (b'V', 0x2F932F),
    (b'W', 0xBF72BF),
    (b'X', 0xFF6100),
    (b'Y', 0x4B4BB5),
];

/// Translocation and non-amino-acid markers produced by the alignment step.
const MARKERS: [(u8, u32); 5] = [
    (b'.', 0xE5F3FF),
    (b'_', 0xFFEEED),
    (b'B', 0xFFF0EF),
    (b'Z', 0xF9EDFF),
    (b'U', 0xFFF3E5),
];

/// matplotlib's viridis map, one entry per byte value.
const VIRIDIS: [u32; 256] = [
    0x440154, 0x440256, 0x450457, 0x450559, 0x46075A, 0x46085C, 0x460A5D, 0x460B5E,
    0x470D60, 0x470E61, 0x471063, 0x471164, 0x471365, 0x481467, 0x481668, 0x481769,
    0x48186A, 0x481A6C, 0x481B6D, 0x481C6E, 0x481D6F, 0x481F70, 0x482071, 0x482173,
    0x482374, 0x482475, 0x482576, 0x482677, 0x482878, 0x482979, 0x472A7A, 0x472C7A,
    0x472D7B, 0x472E7C, 0x472F7D, 0x46307E, 0x46327E, 0x46337F, 0x463480, 0x453581,
    0x453781, 0x453882, 0x443983, 0x443A83, 0x443B84, 0x433D84, 0x433E85, 0x423F85,
    0x424086, 0x424186, 0x414287, 0x414487, 0x404588, 0x404688, 0x3F4788, 0x3F4889,
    0x3E4989, 0x3E4A89, 0x3E4C8A, 0x3D4D8A, 0x3D4E8A, 0x3C4F8A, 0x3C508B, 0x3B518B,
    0x3B528B, 0x3A538B, 0x3A548C, 0x39558C, 0x39568C, 0x38588C, 0x38598C, 0x375A8C,
    0x375B8D, 0x365C8D, 0x365D8D, 0x355E8D, 0x355F8D, 0x34608D, 0x34618D, 0x33628D,
    0x33638D, 0x32648E, 0x32658E, 0x31668E, 0x31678E, 0x31688E, 0x30698E, 0x306A8E,
    0x2F6B8E, 0x2F6C8E, 0x2E6D8E, 0x2E6E8E, 0x2E6F8E, 0x2D708E, 0x2D718E, 0x2C718E,
    0x2C728E, 0x2C738E, 0x2B748E, 0x2B758E, 0x2A768E, 0x2A778E, 0x2A788E, 0x29798E,
    0x297A8E, 0x297B8E, 0x287C8E, 0x287D8E, 0x277E8E, 0x277F8E, 0x27808E, 0x26818E,
    0x26828E, 0x26828E, 0x25838E, 0x25848E, 0x25858E, 0x24868E, 0x24878E, 0x23888E,
    0x23898E, 0x238A8D, 0x228B8D, 0x228C8D, 0x228D8D, 0x218E8D, 0x218F8D, 0x21908D,
    0x21918C, 0x20928C, 0x20928C, 0x20938C, 0x1F948C, 0x1F958B, 0x1F968B, 0x1F978B,
    0x1F988B, 0x1F998A, 0x1F9A8A, 0x1E9B8A, 0x1E9C89, 0x1E9D89, 0x1F9E89, 0x1F9F88,
    0x1FA088, 0x1FA188, 0x1FA187, 0x1FA287, 0x20A386, 0x20A486, 0x21A585, 0x21A685,
    0x22A785, 0x22A884, 0x23A983, 0x24AA83, 0x25AB82, 0x25AC82, 0x26AD81, 0x27AD81,
    0x28AE80, 0x29AF7F, 0x2AB07F, 0x2CB17E, 0x2DB27D, 0x2EB37C, 0x2FB47C, 0x31B57B,
    0x32B67A, 0x34B679, 0x35B779, 0x37B878, 0x38B977, 0x3ABA76, 0x3BBB75, 0x3DBC74,
    0x3FBC73, 0x40BD72, 0x42BE71, 0x44BF70, 0x46C06F, 0x48C16E, 0x4AC16D, 0x4CC26C,
    0x4EC36B, 0x50C46A, 0x52C569, 0x54C568, 0x56C667, 0x58C765, 0x5AC864, 0x5CC863,
    0x5EC962, 0x60CA60, 0x63CB5F, 0x65CB5E, 0x67CC5C, 0x69CD5B, 0x6CCD5A, 0x6ECE58,
    0x70CF57, 0x73D056, 0x75D054, 0x77D153, 0x7AD151, 0x7CD250, 0x7FD34E, 0x81D34D,
    0x84D44B, 0x86D549, 0x89D548, 0x8BD646, 0x8ED645, 0x90D743, 0x93D741, 0x95D840,
    0x98D83E, 0x9BD93C, 0x9DD93B, 0xA0DA39, 0xA2DA37, 0xA5DB36, 0xA8DB34, 0xAADC32,
    0xADDC30, 0xB0DD2F, 0xB2DD2D, 0xB5DE2B, 0xB8DE29, 0xBADE28, 0xBDDF26, 0xC0DF25,
    0xC2DF23, 0xC5E021, 0xC8E020, 0xCAE11F, 0xCDE11D, 0xD0E11C, 0xD2E21B, 0xD5E21A,
    0xD8E219, 0xDAE319, 0xDDE318, 0xDFE318, 0xE2E418, 0xE5E419, 0xE7E419, 0xEAE51A,
    0xECE51B, 0xEFE51C, 0xF1E51D, 0xF4E61E, 0xF6E620, 0xF8E621, 0xFBE723, 0xFDE725,
];

pub fn hex_to_rgb(hex: u32) -> Rgb {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub symbol: char,
    pub rgb: Rgb,
}

/// Fixed 256-entry table indexed by symbol byte. Every entry not explicitly
/// mapped holds the fallback color, so lookups never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    kind: PaletteKind,
    colors: [Rgb; 256],
    mapped: [bool; 256],
    fallback: Rgb,
}

impl Palette {
    pub fn empty(kind: PaletteKind, fallback: Rgb) -> Self {
        Self {
            kind,
            colors: [fallback; 256],
            mapped: [false; 256],
            fallback,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        match config.palette {
            PaletteKind::Spectrum => Self::spectrum(),
            kind => {
                let mut palette = Self::sequence(config.low_contrast);
                palette.kind = kind;
                palette
            }
        }
    }

    /// Nucleotide colors layered over amino acid colors, plus gap and marker colors.
    pub fn sequence(low_contrast: bool) -> Self {
        let mut palette = Self::empty(PaletteKind::Nucleotide, FALLBACK_COLOR);
        for (symbol, hex) in RASMOL {
            palette.set(symbol, hex_to_rgb(hex));
        }
        palette.set(b'N', [122, 122, 122]);
        if low_contrast {
            palette.natural_colors();
        } else {
            palette.high_contrast_colors();
        }
        palette.set(GAP_CHAR, [247, 247, 247]);
        for (symbol, hex) in MARKERS {
            palette.set(symbol, hex_to_rgb(hex));
        }
        palette
    }

    /// Viridis over all byte values. No fallback entry is ever used.
    pub fn spectrum() -> Self {
        let mut palette = Self::empty(PaletteKind::Spectrum, hex_to_rgb(VIRIDIS[0]));
        for (value, &hex) in VIRIDIS.iter().enumerate() {
            palette.set(value as u8, hex_to_rgb(hex));
        }
        palette
    }

    fn high_contrast_colors(&mut self) {
        self.set(b'G', hex_to_rgb(0xFF4100));
        self.set(b'C', hex_to_rgb(0xFF9F00));
        self.set(b'T', hex_to_rgb(0x0B56BE));
        self.set(b'A', hex_to_rgb(0x00C566));
    }

    fn natural_colors(&mut self) {
        self.set(b'G', hex_to_rgb(0xD4403C));
        self.set(b'C', hex_to_rgb(0xE2AE5B));
        self.set(b'T', hex_to_rgb(0x2D6C85));
        self.set(b'A', hex_to_rgb(0x3FB93F));
    }

    pub fn set(&mut self, symbol: u8, rgb: Rgb) {
        self.colors[symbol as usize] = rgb;
        self.mapped[symbol as usize] = true;
    }

    /// Copy of this palette with one symbol recolored.
    pub fn with_color(&self, symbol: u8, rgb: Rgb) -> Self {
        let mut palette = self.clone();
        palette.set(symbol, rgb);
        palette
    }

    #[inline]
    pub fn color(&self, symbol: u8) -> Rgb {
        self.colors[symbol as usize]
    }

    pub fn is_mapped(&self, symbol: u8) -> bool {
        self.mapped[symbol as usize]
    }

    pub fn fallback(&self) -> Rgb {
        self.fallback
    }

    pub fn kind(&self) -> PaletteKind {
        self.kind
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let entries: &[(&str, u8)] = match self.kind {
            PaletteKind::Nucleotide => NUCLEOTIDE_LEGEND.as_slice(),
            PaletteKind::Protein => PROTEIN_LEGEND.as_slice(),
            PaletteKind::Spectrum => SPECTRUM_LEGEND.as_slice(),
        };
        entries
            .iter()
            .map(|&(label, symbol)| LegendEntry {
                label: label.to_string(),
                symbol: symbol as char,
                rgb: self.color(symbol),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_symbols_resolve_to_fallback() {
        let palette = Palette::sequence(false);
        for symbol in [b'J', b'O', b'a', 0u8, 255u8] {
            assert!(!palette.is_mapped(symbol));
            assert_eq!(palette.color(symbol), FALLBACK_COLOR);
        }
    }

    #[test]
    fn nucleotides_override_amino_acid_colors() {
        let high = Palette::sequence(false);
        let natural = Palette::sequence(true);
        assert_eq!(high.color(b'A'), [0x00, 0xC5, 0x66]);
        assert_eq!(natural.color(b'A'), [0x3F, 0xB9, 0x3F]);
        assert_eq!(high.color(b'N'), [122, 122, 122]);
        assert_eq!(high.color(b'D'), [0xEA, 0x35, 0x35]);
    }

    #[test]
    fn gap_and_markers_are_light() {
        let palette = Palette::sequence(false);
        assert_eq!(palette.color(GAP_CHAR), [247, 247, 247]);
        assert_eq!(palette.color(b'.'), [0xE5, 0xF3, 0xFF]);
        assert_eq!(palette.color(b'B'), [0xFF, 0xF0, 0xEF]);
    }

    #[test]
    fn spectrum_spans_viridis() {
        let palette = Palette::spectrum();
        assert_eq!(palette.color(0), hex_to_rgb(0x440154));
        assert_eq!(palette.color(255), hex_to_rgb(0xFDE725));
        assert!((0..=255u8).all(|v| palette.is_mapped(v)));
    }

    #[test]
    fn spectrum_uses_the_full_table_between_anchors() {
        let palette = Palette::spectrum();
        assert_eq!(palette.color(1), [0x44, 0x02, 0x56]);
        assert_eq!(palette.color(100), [0x2A, 0x76, 0x8E]);
        assert_eq!(palette.color(128), [0x21, 0x91, 0x8C]);
        assert_eq!(palette.color(200), [0x70, 0xCF, 0x57]);
    }

    #[test]
    fn legend_follows_kind() {
        let mut config = LayoutConfig::default();
        assert_eq!(Palette::from_config(&config).legend().len(), 5);
        config.palette = PaletteKind::Protein;
        let legend = Palette::from_config(&config).legend();
        assert_eq!(legend.len(), 21);
        assert_eq!(legend[0].symbol, 'A');
    }
}
