// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Unit tests for vertex decoding organized by stage

mod decoder;
mod helpers;
mod properties;
