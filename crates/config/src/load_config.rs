// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "sigil.config.yaml";

/// Walks up from `path` looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Resolves the config file to use: an explicit CLI path wins, then the
/// nearest `sigil.config.yaml` above the working directory, then nothing.
pub fn resolve_config_path(cwd: &Path, cli_file: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return Some(cli_file);
        }
        return Some(cwd.join(cli_file));
    }

    find_in_parent(cwd, DEFAULT_CONFIG_NAME)
}
