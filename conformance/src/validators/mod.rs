//! Run-time validators appended after the cross-check.
//!
//! | Validator | Id | Checks |
//! |-----------|----|--------|
//! | [`rank_map`] | `rank-map/domain`, `rank-map/injective`, `rank-map/onto`, `rank-map/corners` | the rank decode is a bijection onto the process grid |
//! | [`placement`] | `placement/round-trip` | every distributed record's placement agrees with `locate` and `global_of` |

pub mod placement;
pub mod rank_map;
