use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by user-defined flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) typically determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container over any primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    /// Every bit set.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        flags.add_many(tags);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    /// True if any bit is shared with `other`.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// locomotion::define_bitmask_flags!(SurfaceTag, u16, {
///     Ice,
///     Conveyor,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(CollisionLayer, u32, {
    Default,
    Static,
    Platform,
    Dynamic,
    Trigger,
    Player,
});

/// Selects which geometry layers participate in a query.
pub type LayerMask = BitmaskFlags<u32>;

/// Mask used when nothing else is configured: everything except triggers and the player.
pub fn default_collision_mask() -> LayerMask {
    LayerMask::from_flags(&[
        CollisionLayer::Default,
        CollisionLayer::Static,
        CollisionLayer::Platform,
        CollisionLayer::Dynamic,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_and_has() {
        let mut mask = LayerMask::default();
        mask.add(CollisionLayer::Static);
        mask.add(CollisionLayer::Platform);
        assert!(mask.has(CollisionLayer::Static));
        assert!(!mask.has(CollisionLayer::Trigger));

        mask.remove(CollisionLayer::Static);
        assert!(!mask.has(CollisionLayer::Static));
        assert_eq!(mask.bits, 1 << 2);
    }

    #[test]
    fn default_mask_skips_triggers_and_player() {
        let mask = default_collision_mask();
        assert!(mask.has(CollisionLayer::Default));
        assert!(mask.has(CollisionLayer::Dynamic));
        assert!(!mask.has(CollisionLayer::Trigger));
        assert!(!mask.has(CollisionLayer::Player));
    }

    #[test]
    fn intersects_checks_shared_bits() {
        let player = LayerMask::from_flags(&[CollisionLayer::Player]);
        assert!(!default_collision_mask().intersects(player));
        assert!(LayerMask::all().intersects(player));
    }
}
