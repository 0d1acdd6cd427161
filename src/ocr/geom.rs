use crate::ocr::BBoxPx;

pub(crate) fn union_bbox(a: &BBoxPx, b: &BBoxPx) -> BBoxPx {
    let x1 = a.x.min(b.x);
    let y1 = a.y.min(b.y);
    let x2 = a.right().max(b.right());
    let y2 = a.bottom().max(b.bottom());
    BBoxPx {
        x: x1,
        y: y1,
        w: x2 - x1,
        h: y2 - y1,
    }
}

/// Intersection of `bbox` with a `width` x `height` image, `None` when empty.
pub(crate) fn clamp_bbox(bbox: &BBoxPx, width: u32, height: u32) -> Option<BBoxPx> {
    let x1 = bbox.x.min(width);
    let y1 = bbox.y.min(height);
    let x2 = bbox.x.saturating_add(bbox.w).min(width);
    let y2 = bbox.y.saturating_add(bbox.h).min(height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(BBoxPx {
        x: x1,
        y: y1,
        w: x2 - x1,
        h: y2 - y1,
    })
}
