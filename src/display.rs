//! Rank labels and colours for terminal output.

use colored::{Color, ColoredString, Colorize};

use crate::domain::RatingValue;

const NEUTRAL: Color = Color::TrueColor { r: 83, g: 100, b: 113 };

/// Human-readable label for a rating
pub fn rank_label(rating: &RatingValue) -> String {
    if *rating == RatingValue::Deferred {
        return "Pending".to_string();
    }
    match rating.rank() {
        Some(n) => format!("{}/10", n),
        None => "Error".to_string(),
    }
}

/// Colour band for a rating; neutral grey when colours are off or there is no rank
pub fn rank_color(rating: &RatingValue, colorful: bool) -> Color {
    let score = match rating.rank() {
        Some(n) if colorful => n,
        _ => return NEUTRAL,
    };

    match score {
        n if n >= 8 => Color::TrueColor { r: 50, g: 205, b: 50 },
        n if n >= 7 => Color::TrueColor { r: 34, g: 139, b: 34 },
        n if n >= 5 => Color::TrueColor { r: 60, g: 179, b: 113 },
        n if n >= 3 => Color::TrueColor { r: 107, g: 142, b: 35 },
        n if n >= 1 => Color::TrueColor { r: 2, g: 71, b: 49 },
        _ => NEUTRAL,
    }
}

/// Label painted in its colour band, bold like the in-page badge
pub fn paint(rating: &RatingValue, colorful: bool) -> ColoredString {
    rank_label(rating).color(rank_color(rating, colorful)).bold()
}

/// True when a scored post falls at or below a positive hide threshold
pub fn is_hidden(rating: &RatingValue, threshold: i64) -> bool {
    threshold > 0 && rating.score().is_some_and(|n| n <= threshold)
}
