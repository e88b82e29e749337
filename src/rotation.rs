//! Orientation codes delivered by the packing engine.
//!
//! The engine reports how a unit was turned as a small integer. Each code
//! selects one permutation of the item's base (length, width, height):
//!
//! ```text
//! 0: (L,W,H)   1: (W,L,H)   2: (W,H,L)
//! 3: (H,W,L)   4: (H,L,W)   5: (L,H,W)
//! ```

use crate::types::Vec3;

/// One of the six axis-aligned orientations of a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// (L, W, H)
    Upright,
    /// (W, L, H)
    UprightTurned,
    /// (W, H, L)
    SideWidthFirst,
    /// (H, W, L)
    SideHeightFirst,
    /// (H, L, W)
    FlatHeightFirst,
    /// (L, H, W)
    FlatLengthFirst,
}

/// Outcome of decoding a raw rotation code.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationResolution {
    pub orientation: Orientation,
    /// Oriented (length, width, height) in millimeters.
    pub dims: Vec3,
    /// `true` when the code was unknown and the unrotated orientation was used.
    pub fallback: bool,
}

impl Orientation {
    /// All orientations in code order.
    pub const ALL: [Orientation; 6] = [
        Orientation::Upright,
        Orientation::UprightTurned,
        Orientation::SideWidthFirst,
        Orientation::SideHeightFirst,
        Orientation::FlatHeightFirst,
        Orientation::FlatLengthFirst,
    ];

    /// Decodes a raw code; `None` for codes outside 0-5.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Numeric code of this orientation.
    pub fn code(self) -> i32 {
        match self {
            Orientation::Upright => 0,
            Orientation::UprightTurned => 1,
            Orientation::SideWidthFirst => 2,
            Orientation::SideHeightFirst => 3,
            Orientation::FlatHeightFirst => 4,
            Orientation::FlatLengthFirst => 5,
        }
    }

    /// Indices into (L, W, H) that make up the oriented (length, width, height).
    pub const fn permutation(self) -> [usize; 3] {
        match self {
            Orientation::Upright => [0, 1, 2],
            Orientation::UprightTurned => [1, 0, 2],
            Orientation::SideWidthFirst => [1, 2, 0],
            Orientation::SideHeightFirst => [2, 1, 0],
            Orientation::FlatHeightFirst => [2, 0, 1],
            Orientation::FlatLengthFirst => [0, 2, 1],
        }
    }

    /// Applies the permutation to base dimensions.
    pub fn apply(self, base: Vec3) -> Vec3 {
        let axes = [base.x, base.y, base.z];
        let [a, b, c] = self.permutation();
        Vec3::new(axes[a], axes[b], axes[c])
    }
}

/// Resolves a raw rotation code against base dimensions.
///
/// Unknown codes fail closed to [`Orientation::Upright`] and are flagged in
/// the result; placements come from an external engine, so this is a data
/// warning and never an error.
pub fn resolve(base: Vec3, code: i32) -> RotationResolution {
    match Orientation::from_code(code) {
        Some(orientation) => RotationResolution {
            orientation,
            dims: orientation.apply(base),
            fallback: false,
        },
        None => {
            log::warn!(
                "⚠️ Unknown rotation code {}; using the unrotated orientation.",
                code
            );
            RotationResolution {
                orientation: Orientation::Upright,
                dims: base,
                fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIMS: [(f64, f64, f64); 4] = [
        (1200.0, 800.0, 1000.0),
        (1.0, 2.0, 3.0),
        (500.0, 500.0, 250.0),
        (0.5, 1999.0, 33.3),
    ];

    #[test]
    fn table_matches_documented_permutations() {
        let base = Vec3::new(1.0, 2.0, 3.0);
        let expected = [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(2.0, 1.0, 3.0),
            Vec3::new(2.0, 3.0, 1.0),
            Vec3::new(3.0, 2.0, 1.0),
            Vec3::new(3.0, 1.0, 2.0),
            Vec3::new(1.0, 3.0, 2.0),
        ];
        for (code, want) in expected.iter().enumerate() {
            let resolved = resolve(base, code as i32);
            assert_eq!(resolved.dims, *want, "code {}", code);
            assert!(!resolved.fallback);
            assert_eq!(resolved.orientation.code(), code as i32);
        }
    }

    #[test]
    fn every_code_is_a_volume_preserving_permutation() {
        for dims in SAMPLE_DIMS {
            let base = Vec3::from_tuple(dims);
            for code in 0..6 {
                let oriented = resolve(base, code).dims;
                assert_eq!(oriented.sorted_components(), base.sorted_components());
                assert_eq!(oriented.volume(), base.volume());
            }
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_unrotated() {
        let base = Vec3::new(10.0, 20.0, 30.0);
        for code in [-1, 6, 42, i32::MAX, i32::MIN] {
            let resolved = resolve(base, code);
            assert!(resolved.fallback, "code {} must be flagged", code);
            assert_eq!(resolved.orientation, Orientation::Upright);
            assert_eq!(resolved.dims, base);
        }
    }

    #[test]
    fn code_round_trip_covers_all_variants() {
        for orientation in Orientation::ALL {
            assert_eq!(Orientation::from_code(orientation.code()), Some(orientation));
        }
    }
}
