use log::debug;

use crate::core::geometry::{BBox, VerticalOrder};

/// Weight of a citation found `|page_a - page_b|` pages away from its figure.
pub fn page_distance_weight(page_a: usize, page_b: usize) -> f32 {
    match page_a.abs_diff(page_b) {
        0 => 1.0,
        1 => 0.8,
        2..=3 => 0.6,
        _ => 0.3,
    }
}

/// Confidence that a reference on `ref_page` talks about the figure on `figure_page`.
///
/// Same-page pairs always score 1.0. The vertical order of the two boxes is
/// resolved for the debug log only and does not change the score.
pub fn position_weight(
    figure_page: usize,
    figure_bbox: Option<&BBox>,
    ref_page: usize,
    ref_bbox: Option<&BBox>,
) -> f32 {
    if figure_page != ref_page {
        return page_distance_weight(figure_page, ref_page);
    }

    match (figure_bbox, ref_bbox) {
        (Some(figure), Some(reference)) => {
            match reference.vertical_order(figure) {
                VerticalOrder::Above => debug!(
                    "reference above figure (ref_y {} < fig_y {})",
                    reference.y0, figure.y0
                ),
                _ => debug!(
                    "reference below figure (ref_y {} >= fig_y {})",
                    reference.y0, figure.y0
                ),
            }
            1.0
        }
        _ => {
            debug!("no bbox for same-page pair, using default weight");
            1.0
        }
    }
}
