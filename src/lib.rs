// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Apply Magento quality patches after Composer installs or updates.
//!
//! Quality patches are small, versioned fixes for Magento that are applied
//! through the `magento-patches` binary of the quality patches package. This
//! crate hooks into the host dependency manager's install/update cycle, and
//! applies whatever patches the project lists in its manifest.
//!
//! # See Also
//!
//! 1. [`plugin`] for the run itself.
//! 2. [`config`] for the manifest layout.
//! 3. [`recommend`] for release-based patch recommendations.

pub mod config;
pub mod patch;
pub mod path;
pub mod plugin;
pub mod recommend;

pub use config::PluginConfig;
pub use patch::{outcome::RunSummary, Orchestrator};
pub use plugin::{HookEvent, Plugin};
