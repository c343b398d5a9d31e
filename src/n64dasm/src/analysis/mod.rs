/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod string_guesser;

pub use string_guesser::StringGuesserLevel;
