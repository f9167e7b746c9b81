// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation passes a property change can trigger.

bitflags::bitflags! {
    /// Layout and render passes that must re-run when a property changes.
    ///
    /// Flags are declared per property in its metadata (or later through
    /// [`PropertyRegistry::affects_measure`](crate::PropertyRegistry::affects_measure)
    /// and friends) and accumulate on the owning
    /// [`PropertyObject`](crate::PropertyObject) until a layout pass takes them.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Affects: u8 {
        /// The owner's desired size may have changed.
        const MEASURE = 1 << 0;
        /// The owner's children may need to be repositioned.
        const ARRANGE = 1 << 1;
        /// The owner needs to be redrawn.
        const RENDER = 1 << 2;
    }
}

impl Affects {
    /// Everything a layout pass cares about.
    pub const LAYOUT: Self = Self::MEASURE.union(Self::ARRANGE);
}
