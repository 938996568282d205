//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Output size for a thumbnail request, preserving the source aspect ratio.
///
/// - width and height: fit inside the `width x height` box
/// - width only: scale to that width
/// - height only: scale to that height
///
/// Images are never enlarged, and neither side drops below one pixel.
/// Returns `None` when no side was requested.
///
/// ```
/// # use simple_web::imaging::calculate_thumbnail_size;
/// assert_eq!(calculate_thumbnail_size((800, 600), Some(400), None), Some((400, 300)));
/// assert_eq!(calculate_thumbnail_size((800, 600), Some(400), Some(100)), Some((133, 100)));
/// ```
pub fn calculate_thumbnail_size(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return Some((src_w, src_h));
    }

    let scale_w = width.map(|w| w as f64 / src_w as f64);
    let scale_h = height.map(|h| h as f64 / src_h as f64);
    let scale = match (scale_w, scale_h) {
        (Some(sw), Some(sh)) => sw.min(sh),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => return None,
    }
    .min(1.0);

    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    Some((scaled(src_w), scaled(src_h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_only_keeps_ratio() {
        assert_eq!(
            calculate_thumbnail_size((1200, 800), Some(300), None),
            Some((300, 200))
        );
    }

    #[test]
    fn height_only_keeps_ratio() {
        assert_eq!(
            calculate_thumbnail_size((1200, 800), None, Some(100)),
            Some((150, 100))
        );
    }

    #[test]
    fn box_fit_landscape_limited_by_width() {
        assert_eq!(
            calculate_thumbnail_size((1600, 900), Some(320), Some(320)),
            Some((320, 180))
        );
    }

    #[test]
    fn box_fit_portrait_limited_by_height() {
        assert_eq!(
            calculate_thumbnail_size((600, 900), Some(400), Some(300)),
            Some((200, 300))
        );
    }

    #[test]
    fn never_enlarges() {
        assert_eq!(
            calculate_thumbnail_size((100, 50), Some(400), None),
            Some((100, 50))
        );
    }

    #[test]
    fn tiny_results_keep_one_pixel() {
        assert_eq!(
            calculate_thumbnail_size((4000, 10), Some(40), None),
            Some((40, 1))
        );
    }

    #[test]
    fn no_size_requested() {
        assert_eq!(calculate_thumbnail_size((100, 100), None, None), None);
    }
}
