// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Guest memory tests
//!
//! - `basic`: region identification and reads/writes
//! - `regions`: segment masking, mirroring and region boundaries
//! - `helpers`: common test utilities

use super::*;

mod helpers;
