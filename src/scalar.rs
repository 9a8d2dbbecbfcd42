//! Element type bounds for views and owners.

/// Shared trait bounds for every element type a view can address.
///
/// `Default` is needed to allocate owners before they are filled, `Debug`
/// so failed comparisons in tests print something useful. Arithmetic is not
/// required: views only move elements around.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug {}

impl<T> Element for T where T: Copy + Default + PartialEq + std::fmt::Debug {}
