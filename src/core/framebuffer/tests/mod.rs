// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for the framebuffer cache organized by concern

mod convert;
mod helpers;
