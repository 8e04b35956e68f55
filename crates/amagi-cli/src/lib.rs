// Copyright 2025 Amagi Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Amagi CLI
//!
//! Command-line front-end for the Amagi search dispatcher.
//!
//! ## Key Commands
//!
//! - `amagi search`: Search tracks across the nodes (outputs raw JSON for scripting)
//! - `amagi status`: Probe every node and report node and cache state as JSON
//!
//! Nodes come from `--node auth@host` flags, a JSON config file (`-c`), or
//! both. The [`commands`] module holds the subcommand logic so it can be
//! driven without going through argument parsing.

pub mod commands;
