//! Frame index selection.
//!
//! A [`SamplingPlan`] lists which source frames to read, in order. Indices
//! are spread evenly over the whole timeline so the first and last frames
//! are always included.
//!
//! # Example
//!
//! ```
//! use framesample::{PlanRounding, build_plan};
//!
//! let plan = build_plan(100, 10, PlanRounding::Nearest).unwrap();
//! assert_eq!(plan.first(), Some(0));
//! assert_eq!(plan.last(), Some(99));
//! assert_eq!(plan.len(), 10);
//! ```

use std::{ops::Index, slice::Iter};

use crate::error::SamplerError;

/// How interpolated positions are mapped to whole frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanRounding {
    /// Round to the nearest index, halves rounding up. This is the default.
    #[default]
    Nearest,
    /// Truncate towards zero.
    Floor,
}

/// An ordered list of source frame indices to sample.
///
/// Invariants: non-empty, non-decreasing, every index below the source's
/// frame count, first index `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SamplingPlan {
    indices: Vec<u64>,
    total_frames: u64,
}

impl SamplingPlan {
    /// The planned frame indices.
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Number of planned attempts.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always `false` for a plan produced by [`build_plan`].
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Frame count of the source the plan was built for.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn first(&self) -> Option<u64> {
        self.indices.first().copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.indices.last().copied()
    }

    /// Iterate `(sequence, frame_index)` pairs with 1-based sequence numbers.
    pub fn sequenced(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        (1_u32..).zip(self.indices.iter().copied())
    }

    /// Iterate the raw indices.
    pub fn iter(&self) -> Iter<'_, u64> {
        self.indices.iter()
    }
}

impl Index<usize> for SamplingPlan {
    type Output = u64;

    fn index(&self, position: usize) -> &u64 {
        &self.indices[position]
    }
}

impl<'a> IntoIterator for &'a SamplingPlan {
    type Item = &'a u64;
    type IntoIter = Iter<'a, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

/// Spread `frame_count` indices evenly over `[0, total_frames - 1]`.
///
/// Uses exact integer arithmetic, so the result never depends on
/// floating-point precision. When `frame_count` exceeds `total_frames` the
/// plan repeats indices instead of failing.
///
/// # Errors
///
/// Returns [`SamplerError::InvalidJob`] if either count is zero.
pub fn build_plan(
    total_frames: u64,
    frame_count: u32,
    rounding: PlanRounding,
) -> Result<SamplingPlan, SamplerError> {
    if total_frames == 0 {
        return Err(SamplerError::InvalidJob {
            field: "total_frames",
            reason: "must be greater than zero".to_string(),
        });
    }
    if frame_count == 0 {
        return Err(SamplerError::InvalidJob {
            field: "frame_count",
            reason: "must be greater than zero".to_string(),
        });
    }

    let last = u128::from(total_frames - 1);
    let steps = u128::from(frame_count) - 1;

    let indices = (0..u128::from(frame_count))
        .map(|position| {
            if steps == 0 {
                return 0;
            }
            let scaled = position * last;
            let index = match rounding {
                PlanRounding::Nearest => (2 * scaled + steps) / (2 * steps),
                PlanRounding::Floor => scaled / steps,
            };
            // index <= last < 2^64 because position <= steps.
            index as u64
        })
        .collect();

    Ok(SamplingPlan {
        indices,
        total_frames,
    })
}
