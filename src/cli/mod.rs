// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the fundlens binary.

pub mod funds_cmd;
pub mod output;
pub mod projects_cmd;
pub mod rounds_cmd;
