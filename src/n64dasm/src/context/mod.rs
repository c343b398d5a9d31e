/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod context_builder;
mod the_context;

pub use context_builder::{
    ContextBuilder, ContextBuilderOverlay, EmptyOverlayCategoryError, OverlaysBuilder,
    SegmentModifier,
};
pub use the_context::{Context, OverlayCategory, OwnedSegmentNotFoundError};
