/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::fmt;

/// Name of a group of overlay segments that share an address range.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverlayCategoryName {
    inner: String,
}

impl OverlayCategoryName {
    pub const fn new(name: String) -> Self {
        Self { inner: name }
    }

    pub fn inner(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for OverlayCategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}
