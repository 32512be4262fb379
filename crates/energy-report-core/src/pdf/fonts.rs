// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Metrics and encoding of the two standard fonts used by the report.
//!
//! Both fonts are the built-in Helvetica faces with WinAnsi encoding, so text is reduced to
//! that code page before layout and serialization.

/// Font variant of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
}

impl FontStyle {
    /// Resource name of the font inside a page
    #[must_use]
    pub fn resource_name(&self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
        }
    }

    #[must_use]
    pub fn base_font(&self) -> &'static [u8] {
        match self {
            Self::Regular => b"Helvetica",
            Self::Bold => b"Helvetica-Bold",
        }
    }
}

/// Helvetica advance widths for codes 32..=126, in 1/1000 em
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for codes 32..=126, in 1/1000 em
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

const DEFAULT_WIDTH: u16 = 556;

/// Encode text as WinAnsi bytes
///
/// Common symbols outside the code page are spelled with ASCII, subscript digits are
/// flattened and pictographs are dropped. Anything else becomes `?`.
#[must_use]
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        if is_pictograph(c) {
            continue;
        }
        match transliterate(c) {
            Some(ascii) => bytes.extend_from_slice(ascii.as_bytes()),
            None => bytes.push(win_ansi_byte(c)),
        }
    }
    bytes
}

fn transliterate(c: char) -> Option<&'static str> {
    let ascii = match c {
        '→' | '⇒' | '⟶' => "->",
        '←' | '⇐' | '⟵' => "<-",
        '↔' | '⇔' => "<->",
        '↑' => "^",
        '↓' => "v",
        '≈' | '∼' => "~",
        '≤' => "<=",
        '≥' => ">=",
        '≠' => "!=",
        '−' | '‐' | '‑' | '‒' => "-",
        '∕' | '⁄' => "/",
        '×' | '✕' => "x",
        '✓' | '✔' => "v",
        '✗' | '✘' => "x",
        '′' => "'",
        '″' => "\"",
        '‣' | '◦' | '▪' | '▸' | '►' => "-",
        '∞' => "inf",
        '⁰' => "^0",
        '⁴' => "^4",
        '⁵' => "^5",
        '⁶' => "^6",
        '⁷' => "^7",
        '⁸' => "^8",
        '⁹' => "^9",
        _ => return None,
    };
    Some(ascii)
}

/// Emoji, their joiners and variation selectors
fn is_pictograph(c: char) -> bool {
    matches!(
        c,
        '\u{1F000}'..='\u{1FAFF}'
            | '\u{2600}'..='\u{26FF}'
            | '\u{2700}'..='\u{2712}'
            | '\u{2B00}'..='\u{2BFF}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{200D}'
    )
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        c if c.is_ascii_control() => b'?',
        c if c.is_ascii() => c as u8,
        '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).unwrap_or(b'?'),
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        '\u{2009}' => b' ',
        '\u{202f}' => 0xA0,
        '₀'..='₉' => b'0' + (u32::from(c) - u32::from('₀')) as u8,
        _ => b'?',
    }
}

/// Advance width of one encoded byte, in 1/1000 em
#[must_use]
pub fn glyph_width(byte: u8, style: FontStyle) -> u16 {
    let bold = style == FontStyle::Bold;
    let ascii = |c: u8| {
        let table = if bold {
            &HELVETICA_BOLD_ASCII
        } else {
            &HELVETICA_ASCII
        };
        table
            .get(usize::from(c.saturating_sub(32)))
            .copied()
            .unwrap_or(DEFAULT_WIDTH)
    };

    match byte {
        32..=126 => ascii(byte),
        0x85 | 0x97 => 1000,
        0x91 | 0x92 => {
            if bold {
                278
            } else {
                222
            }
        }
        0x93 | 0x94 => {
            if bold {
                500
            } else {
                333
            }
        }
        0x95 => 350,
        0x9C => 944,
        0xA0 => 278,
        0xB0 => 400,
        0xB2 | 0xB3 => 333,
        0xD7 => 584,
        0xC0..=0xC5 => ascii(b'A'),
        0xC7 => ascii(b'C'),
        0xC8..=0xCB => ascii(b'E'),
        0xCC..=0xCF => ascii(b'I'),
        0xD1 => ascii(b'N'),
        0xD2..=0xD6 => ascii(b'O'),
        0xD9..=0xDC => ascii(b'U'),
        0xDD => ascii(b'Y'),
        0xDF => 611,
        0xE0..=0xE5 => ascii(b'a'),
        0xE7 => ascii(b'c'),
        0xE8..=0xEB => ascii(b'e'),
        0xEC..=0xEF => 278,
        0xF1 => ascii(b'n'),
        0xF2..=0xF6 => ascii(b'o'),
        0xF9..=0xFC => ascii(b'u'),
        0xFD | 0xFF => ascii(b'y'),
        _ => DEFAULT_WIDTH,
    }
}

/// Width of `text` set in `style` at `size` points, in points
#[must_use]
pub fn text_width(text: &str, style: FontStyle, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|byte| u32::from(glyph_width(byte, style)))
        .sum();
    units as f32 * size / 1000.0
}
