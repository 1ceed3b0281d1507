use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Shader files compiled into the binary, looked up by file name.
pub const BUNDLED: &[(&str, &str)] = &[
    ("vertex-setup.wgsl", include_str!("shaders/vertex-setup.wgsl")),
    ("fragment-setup.wgsl", include_str!("shaders/fragment-setup.wgsl")),
    ("vertex-raycast.wgsl", include_str!("shaders/vertex-raycast.wgsl")),
    ("fragment-raycast.wgsl", include_str!("shaders/fragment-raycast.wgsl")),
];

/// Where a shader pair was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    Local(PathBuf),
    Bundled,
}

#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub origin: ShaderOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSourceError {
    pub vertex: String,
    pub fragment: String,
}

impl fmt::Display for ShaderSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "one or more shader files not found: {}, {}", self.vertex, self.fragment)
    }
}

impl std::error::Error for ShaderSourceError {}

/// Resolves a vertex + fragment pair.
///
/// The local directory (a developer override, edited shaders are picked up
/// without rebuilding) is tried first; if either file is missing there both
/// come from `bundled`. A pair is never mixed across the two sources.
pub fn load_pair(
    local_dir: Option<&Path>,
    bundled: &[(&str, &str)],
    vertex: &str,
    fragment: &str,
) -> Result<ShaderSources, ShaderSourceError> {
    if let Some(dir) = local_dir {
        match (read_local(dir, vertex), read_local(dir, fragment)) {
            (Some(v), Some(f)) => {
                return Ok(ShaderSources {
                    vertex: v,
                    fragment: f,
                    origin: ShaderOrigin::Local(dir.to_path_buf()),
                });
            }
            _ => log::debug!("shader pair {vertex}, {fragment} not in {}; using bundled copy", dir.display()),
        }
    }

    let lookup = |name: &str| bundled.iter().find(|(n, _)| *n == name).map(|(_, src)| src.to_string());
    match (lookup(vertex), lookup(fragment)) {
        (Some(v), Some(f)) => Ok(ShaderSources {
            vertex: v,
            fragment: f,
            origin: ShaderOrigin::Bundled,
        }),
        _ => Err(ShaderSourceError {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        }),
    }
}

fn read_local(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(src) => Some(src),
        Err(e) => {
            log::debug!("can't open {}: {e}", path.display());
            None
        }
    }
}
