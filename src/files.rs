//! Serving result files: path sanitization and content types.

use std::path::{Component, Path, PathBuf};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Lexically normalizes a requested path and drops anything that would
/// climb above the root: leading `..` segments, root and prefix components.
pub fn sanitize(requested: &str) -> PathBuf {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.iter().collect()
}

/// Resolves a requested path under `root`; `None` when nothing is there.
pub fn resolve_download_path(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = sanitize(requested);
    if relative.as_os_str().is_empty() {
        return None;
    }
    let full = root.join(relative);
    full.is_file().then_some(full)
}

/// MIME type inferred from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("xlsx") => XLSX_MIME,
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition` value for downloading `path` as an attachment.
pub fn attachment_header(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let ascii: String =
        name.chars().map(|c| if c.is_ascii() && c != '"' { c } else { '_' }).collect();
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, urlencoding::encode(&name))
}
