use ratatui::{style::palette::tailwind, style::Color};
use unicode_width::UnicodeWidthStr;

pub const PALETTES: [tailwind::Palette; 4] = [
    tailwind::BLUE,
    tailwind::EMERALD,
    tailwind::INDIGO,
    tailwind::RED,
];

pub enum CurrentScreen {
    Login,
    Dues,
}

// all table functions copied from table.rs ratatui example
pub struct LedgerColors {
    pub buffer_bg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub row_fg: Color,
    pub selected_row_style_fg: Color,
    pub normal_row_color: Color,
    pub alt_row_color: Color,
    pub footer_border_color: Color,
}

impl LedgerColors {
    pub const fn new(color: &tailwind::Palette) -> Self {
        Self {
            buffer_bg: tailwind::SLATE.c950,
            header_bg: color.c900,
            header_fg: tailwind::SLATE.c200,
            row_fg: tailwind::SLATE.c200,
            selected_row_style_fg: color.c400,
            normal_row_color: tailwind::SLATE.c950,
            alt_row_color: tailwind::SLATE.c900,
            footer_border_color: color.c400,
        }
    }
}

/// One member row rendered for the dues table: the member name plus 13
/// formatted slot cells.
pub struct DisplayableDuesRow {
    pub member: String,
    pub cells: Vec<String>,
}

pub fn dues_table_constraint_len_calculator(rows: &[DisplayableDuesRow]) -> (u16, u16) {
    let member_len = rows
        .iter()
        .map(|r| r.member.as_str())
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0);
    let cell_len = rows
        .iter()
        .flat_map(|r| r.cells.iter())
        .map(|c| UnicodeWidthStr::width(c.as_str()))
        .max()
        .unwrap_or(0);

    (member_len as u16, cell_len as u16)
}
