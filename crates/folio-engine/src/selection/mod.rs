//! Points, ranges and selections, their ordering and their canonical form.

pub mod compare;
pub mod normalize;
pub mod point;
pub mod range;
pub mod selection_range;

pub use compare::{CompareKeysResult, PointKey, compare_keys, compare_points, make_point_key};
pub use normalize::{
    FixSelectionRangeFn, NormalizeOptions, keep_selection_range, normalize_selection,
    sort_and_merge_and_fix_selection_ranges,
};
pub use point::Point;
pub use range::{Range, RangeDirection, get_range_direction};
pub use selection_range::{
    Selection, SelectionRange, SelectionRangeIntention, is_selection_collapsed_in_text,
    selection_range_anchor_and_focus,
};
