// Color palette for the launcher panel
use ratatui::style::Color;

pub const ACCENT_PRIMARY: Color = Color::Rgb(255, 121, 97);
pub const ACCENT_SECONDARY: Color = Color::Rgb(118, 214, 140);
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(250, 204, 92);
pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 235);
pub const TEXT_SECONDARY: Color = Color::Rgb(140, 143, 158);
pub const BG_DARK: Color = Color::Rgb(28, 29, 36);
pub const BG_SELECTED: Color = Color::Rgb(54, 57, 74);
pub const BORDER_COLOR: Color = Color::Rgb(84, 88, 110);
