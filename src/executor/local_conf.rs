//! Managed block inside `conf/local.conf`.
//!
//! oebuild owns one delimited block of `local.conf` and rewrites it from
//! `compile.yaml` before every build. Everything outside the block belongs
//! to the user and is left untouched.

use crate::compile::CompileConfig;
use crate::error::{OebuildError, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const BLOCK_BEGIN: &str = "# >>> oebuild managed >>>";
pub const BLOCK_END: &str = "# <<< oebuild managed <<<";

/// Render the managed block for `compile`, delimiters included.
pub fn render_block(compile: &CompileConfig) -> String {
    let mut lines = vec![
        BLOCK_BEGIN.to_string(),
        assign("MACHINE", &compile.machine),
    ];

    let optional = [
        ("TOOLCHAIN_DIR", compile.toolchain_dir.as_deref()),
        ("NATIVESDK_DIR", compile.nativesdk_dir.as_deref()),
        ("SSTATE_DIR", compile.sstate_dir.as_deref()),
        ("TMPDIR", compile.tmp_dir.as_deref()),
    ];
    for (var, value) in optional {
        if let Some(value) = value {
            lines.push(assign(var, value));
        }
    }

    if let Some(cache) = compile.sstate_cache.as_deref() {
        lines.push(assign(
            "SSTATE_MIRRORS",
            &format!("file://.* file://{}/PATH", cache.trim_end_matches('/')),
        ));
    }

    if let Some(extra) = compile.local_conf.as_deref() {
        lines.extend(
            extra
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }

    lines.push(BLOCK_END.to_string());
    let mut block = lines.join("\n");
    block.push('\n');
    block
}

fn assign(var: &str, value: &str) -> String {
    format!("{} = \"{}\"", var, value.replace('"', "\\\""))
}

/// Replace the managed block in `existing` with `block`, or append it.
///
/// The block runs from the first end marker that has a begin marker before
/// it back to the closest such begin marker. Unpaired markers are treated as
/// user text.
pub fn merge(existing: &str, block: &str) -> String {
    let span = existing
        .match_indices(BLOCK_END)
        .find_map(|(end, _)| existing[..end].rfind(BLOCK_BEGIN).map(|begin| (begin, end)));

    match span {
        Some((begin, end)) => {
            let mut after = end + BLOCK_END.len();
            if existing[after..].starts_with('\n') {
                after += 1;
            }
            format!("{}{}{}", &existing[..begin], block, &existing[after..])
        }
        None => {
            let mut merged = existing.to_string();
            if !merged.is_empty() && !merged.ends_with('\n') {
                merged.push('\n');
            }
            merged.push_str(block);
            merged
        }
    }
}

/// Write the managed block for `compile` into the local.conf at `path`.
///
/// Returns true if the file content changed.
pub fn apply(path: &Path, compile: &CompileConfig) -> Result<bool> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(OebuildError::io(path, e)),
    };

    let merged = merge(&existing, &render_block(compile));
    if merged == existing {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OebuildError::io(parent, e))?;
    }
    write_atomic(path, merged.as_bytes())?;
    tracing::debug!("updated {}", path.display());
    Ok(true)
}

/// Replace `path` through a synced sibling temp file.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "local.conf".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file = File::create(&temp_path).map_err(|e| OebuildError::io(&temp_path, e))?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| OebuildError::io(&temp_path, e))?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        OebuildError::io(path, e)
    })
}
