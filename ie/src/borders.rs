use crate::{Image, Rect};

/// Channel sum at or above which a pixel counts as picture, not border.
const CONTENT_SUM: u32 = 20;

/// Find the game picture inside black capture borders.
///
/// A row or column belongs to the picture when any of its pixels is not
/// near-black. On an axis where the detected span is less than half the frame
/// (a dark scene, a loading screen) the whole axis is kept.
pub fn detect_borders(image: Image) -> Rect {
    let (w, h) = (image.width(), image.height());
    let mut cols = vec![false; w as usize];
    let mut rows = vec![false; h as usize];

    for y in 0..h {
        for x in 0..w {
            if image.get(x, y).channel_sum() >= CONTENT_SUM {
                cols[x as usize] = true;
                rows[y as usize] = true;
            }
        }
    }

    let (x, width) = span(&cols);
    let (y, height) = span(&rows);
    Rect::new(x, y, width, height)
}

fn span(content: &[bool]) -> (u32, u32) {
    let len = content.len() as u32;
    let first = content.iter().position(|v| *v);
    let last = content.iter().rposition(|v| *v);

    match (first, last) {
        (Some(first), Some(last)) if (last - first) as u32 >= len / 2 => (first as u32, (last - first) as u32 + 1),
        _ => (0, len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, OwnedImage};

    #[test]
    fn trims_letterbox() {
        let mut img = OwnedImage::new(200, 100, Color::BLACK);
        img.fill_rect(Rect::new(10, 5, 180, 90), Color::new(30, 30, 30));
        assert_eq!(detect_borders(img.as_image()), Rect::new(10, 5, 180, 90));
    }

    #[test]
    fn near_black_is_border() {
        let mut img = OwnedImage::new(200, 100, Color::new(6, 6, 6));
        img.fill_rect(Rect::new(0, 20, 200, 60), Color::new(200, 10, 10));
        assert_eq!(detect_borders(img.as_image()), Rect::new(0, 20, 200, 60));
    }

    #[test]
    fn small_content_keeps_full_axis() {
        let mut img = OwnedImage::new(200, 100, Color::BLACK);
        img.fill_rect(Rect::new(90, 10, 20, 80), Color::WHITE);
        assert_eq!(detect_borders(img.as_image()), Rect::new(0, 10, 200, 80));

        let dark = OwnedImage::new(64, 32, Color::BLACK);
        assert_eq!(detect_borders(dark.as_image()), Rect::new(0, 0, 64, 32));
    }
}
