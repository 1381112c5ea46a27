use serde::Serialize;

use crate::statement::is_negative_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLUE: Rgb = Rgb(0, 70, 140);
pub const HIGHLIGHT: Rgb = Rgb(220, 235, 250);
pub const ZEBRA: Rgb = Rgb(245, 245, 245);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const BORDER: Rgb = Rgb(180, 180, 180);
pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const MUTED: Rgb = Rgb(100, 100, 100);
/// Negative money values
pub const WARNING: Rgb = Rgb(200, 30, 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    /// Size in points
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl Font {
    pub const fn regular(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            size,
            bold: true,
            italic: false,
        }
    }

    pub const fn italic(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: true,
        }
    }
}

/// Fill of the `index`-th data row of a table
pub fn zebra(index: usize) -> Rgb {
    if index % 2 == 0 {
        WHITE
    } else {
        ZEBRA
    }
}

/// Text colour of a money value
pub fn money_color(value: f64) -> Rgb {
    if is_negative_amount(value) {
        WARNING
    } else {
        BLACK
    }
}
