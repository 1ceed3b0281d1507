//! Name-based lookup of WGSL interface points.
//!
//! wgpu has no runtime reflection, so resource bindings and vertex attributes
//! are recovered from the shader text. Only the declaration forms the volume
//! shaders use are recognized:
//!
//! ```text
//! @group(0) @binding(N) var<uniform> name: type;
//! @group(0) @binding(N) var name: texture_Xd<f32>;   // or `sampler`
//! struct S { @location(N) name: type, ... }          // used as @vertex input
//! @vertex fn main(@location(N) name: type, ...)      // direct parameters
//! ```

use std::collections::HashMap;

/// What a resource binding holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// Uniform buffer of `size` bytes (already rounded to 16).
    Uniform { size: u64 },
    Texture { dimension: wgpu::TextureViewDimension },
    Sampler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub index: u32,
    pub name: String,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub location: u32,
    pub name: String,
}

/// Bindings and vertex attributes declared by a vertex + fragment pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    bindings: Vec<Binding>,
    attributes: Vec<Attribute>,
}

impl ShaderInterface {
    /// Scans both stages. Bindings declared in both are recorded once.
    pub fn parse(vertex: &str, fragment: &str) -> Result<Self, String> {
        let mut bindings: Vec<Binding> = Vec::new();
        for source in [vertex, fragment] {
            for binding in parse_bindings(source)? {
                match bindings.iter().find(|b| b.index == binding.index) {
                    Some(existing) if *existing == binding => {}
                    Some(existing) => {
                        return Err(format!(
                            "binding {} declared as both `{}` and `{}`",
                            binding.index, existing.name, binding.name
                        ));
                    }
                    None => bindings.push(binding),
                }
            }
        }
        bindings.sort_by_key(|b| b.index);

        Ok(Self {
            bindings,
            attributes: parse_vertex_attributes(vertex),
        })
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

fn parse_bindings(source: &str) -> Result<Vec<Binding>, String> {
    let source = strip_comments(source);
    let mut out = Vec::new();

    let mut rest = source.as_str();
    while let Some(at) = rest.find("@binding(") {
        rest = &rest[at + "@binding(".len()..];
        let (index, after) = parse_index(rest).ok_or("malformed @binding attribute")?;

        let decl_end = after.find(';').ok_or("unterminated binding declaration")?;
        let decl = after[..decl_end].trim();
        rest = &after[decl_end..];

        let decl = decl
            .strip_prefix("var")
            .ok_or_else(|| format!("binding {index} is not a `var` declaration"))?
            .trim_start();

        let (space, decl) = match decl.strip_prefix('<') {
            Some(d) => {
                let close = d.find('>').ok_or("unterminated address space")?;
                (Some(d[..close].trim()), d[close + 1..].trim_start())
            }
            None => (None, decl),
        };

        let (name, ty) = decl
            .split_once(':')
            .ok_or_else(|| format!("binding {index} has no type"))?;
        let name = name.trim().to_string();
        let ty = ty.trim();

        let kind = match space {
            Some("uniform") => BindingKind::Uniform {
                size: uniform_size(ty).ok_or_else(|| format!("unsupported uniform type `{ty}` for `{name}`"))?,
            },
            Some(other) => return Err(format!("unsupported address space `{other}` for `{name}`")),
            None => resource_kind(ty).ok_or_else(|| format!("unsupported resource type `{ty}` for `{name}`"))?,
        };

        out.push(Binding { index, name, kind });
    }

    Ok(out)
}

fn parse_vertex_attributes(source: &str) -> Vec<Attribute> {
    let source = strip_comments(source);
    let structs = parse_structs(&source);

    let Some(at) = source.find("@vertex") else {
        return Vec::new();
    };
    let after = &source[at..];
    let (Some(open), Some(close)) = (after.find('('), after.find(')')) else {
        return Vec::new();
    };
    // `@location(` inside the parameter list also contains parentheses; find
    // the list end by balancing.
    let params = balanced(&after[open..]).unwrap_or(&after[open + 1..close]);

    let mut out = Vec::new();
    for param in split_top_level(params) {
        let param = param.trim();
        if param.starts_with("@location(") {
            if let Some(attr) = parse_located_member(param) {
                out.push(attr);
            }
        } else if let Some((_, ty)) = param.split_once(':') {
            if let Some(fields) = structs.get(ty.trim()) {
                out.extend(fields.iter().cloned());
            }
        }
    }
    out.sort_by_key(|a| a.location);
    out
}

fn parse_structs(source: &str) -> HashMap<String, Vec<Attribute>> {
    let mut out = HashMap::new();
    let mut rest = source;
    while let Some(at) = rest.find("struct ") {
        rest = &rest[at + "struct ".len()..];
        let Some(open) = rest.find('{') else { break };
        let Some(close) = rest.find('}') else { break };
        if close < open {
            rest = &rest[close + 1..];
            continue;
        }
        let name = rest[..open].trim().to_string();
        let body = &rest[open + 1..close];
        let fields = split_top_level(body)
            .into_iter()
            .filter_map(|f| parse_located_member(f.trim()))
            .collect();
        out.insert(name, fields);
        rest = &rest[close + 1..];
    }
    out
}

/// Parses `@location(N) [other attributes] name: type`.
fn parse_located_member(member: &str) -> Option<Attribute> {
    let after = member.strip_prefix("@location(")?;
    let (location, rest) = parse_index(after)?;
    let (head, _) = rest.split_once(':')?;
    // Skip further attributes such as @interpolate(flat).
    let name = head.split_whitespace().last()?;
    if name.starts_with('@') {
        return None;
    }
    Some(Attribute {
        location,
        name: name.to_string(),
    })
}

/// Parses `N)` and returns the number and the text after the parenthesis.
fn parse_index(s: &str) -> Option<(u32, &str)> {
    let close = s.find(')')?;
    let index = s[..close].trim().parse().ok()?;
    Some((index, &s[close + 1..]))
}

/// Contents of the parenthesized group starting at `s[0] == '('`.
fn balanced(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas that are not nested in `()` or `<>`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if !s[start..].trim().is_empty() {
        parts.push(&s[start..]);
    }
    parts
}

fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| line.split_once("//").map_or(line, |(code, _)| code))
        .collect::<Vec<_>>()
        .join("\n")
}

fn uniform_size(ty: &str) -> Option<u64> {
    let size = match ty.replace(' ', "").as_str() {
        "f32" | "i32" | "u32" => 4,
        "vec2<f32>" | "vec2f" => 8,
        "vec3<f32>" | "vec3f" | "vec4<f32>" | "vec4f" => 16,
        "mat4x4<f32>" | "mat4x4f" => 64,
        _ => return None,
    };
    Some(size.max(16))
}

fn resource_kind(ty: &str) -> Option<BindingKind> {
    let ty = ty.replace(' ', "");
    let dimension = match ty.as_str() {
        "sampler" => return Some(BindingKind::Sampler),
        t if t.starts_with("texture_2d<") => wgpu::TextureViewDimension::D2,
        t if t.starts_with("texture_3d<") => wgpu::TextureViewDimension::D3,
        _ => return None,
    };
    Some(BindingKind::Texture { dimension })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
        @group(0) @binding(0) var<uniform> view: mat4x4<f32>;
        @group(0) @binding(1) var<uniform> projection: mat4x4<f32>;

        struct VertexInput {
            @location(0) vertex: vec3<f32>,
        };

        struct VertexOutput {
            @builtin(position) clip: vec4<f32>,
            @location(0) world: vec3<f32>,
        };

        @vertex
        fn vs_main(in: VertexInput) -> VertexOutput {
            var out: VertexOutput;
            return out;
        }
    "#;

    const FRAGMENT: &str = r#"
        // @group(0) @binding(9) var<uniform> ignored: f32;
        @group(0) @binding(2) var volume: texture_3d<f32>;
        @group(0) @binding(3) var volume_sampler: sampler;
        @group(0) @binding(4) var<uniform> camerapos: vec3<f32>;

        @fragment
        fn fs_main(@location(0) world: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(world, 1.0);
        }
    "#;

    // ── bindings ──────────────────────────────────────────────────────────

    #[test]
    fn finds_bindings_across_stages() {
        let iface = ShaderInterface::parse(VERTEX, FRAGMENT).unwrap();
        let names: Vec<&str> = iface.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["view", "projection", "volume", "volume_sampler", "camerapos"]);
    }

    #[test]
    fn binding_kinds_and_sizes() {
        let iface = ShaderInterface::parse(VERTEX, FRAGMENT).unwrap();
        assert_eq!(iface.binding("view").unwrap().kind, BindingKind::Uniform { size: 64 });
        assert_eq!(iface.binding("camerapos").unwrap().kind, BindingKind::Uniform { size: 16 });
        assert_eq!(
            iface.binding("volume").unwrap().kind,
            BindingKind::Texture {
                dimension: wgpu::TextureViewDimension::D3
            }
        );
        assert_eq!(iface.binding("volume_sampler").unwrap().kind, BindingKind::Sampler);
    }

    #[test]
    fn commented_out_bindings_are_ignored() {
        let iface = ShaderInterface::parse(VERTEX, FRAGMENT).unwrap();
        assert!(iface.binding("ignored").is_none());
        assert!(iface.bindings().iter().all(|b| b.index != 9));
    }

    #[test]
    fn conflicting_binding_is_an_error() {
        let frag = "@group(0) @binding(0) var<uniform> other: f32;";
        assert!(ShaderInterface::parse(VERTEX, frag).is_err());
    }

    #[test]
    fn shared_binding_is_recorded_once() {
        let frag = "@group(0) @binding(1) var<uniform> projection: mat4x4<f32>;";
        let iface = ShaderInterface::parse(VERTEX, frag).unwrap();
        assert_eq!(iface.bindings().len(), 2);
    }

    #[test]
    fn unsupported_uniform_type_is_an_error() {
        let frag = "@group(0) @binding(5) var<uniform> weird: array<f32, 4>;";
        assert!(ShaderInterface::parse(VERTEX, frag).is_err());
    }

    // ── attributes ────────────────────────────────────────────────────────

    #[test]
    fn struct_input_attributes() {
        let iface = ShaderInterface::parse(VERTEX, FRAGMENT).unwrap();
        assert_eq!(iface.attributes().len(), 1);
        assert_eq!(iface.attribute("vertex").unwrap().location, 0);
        // Vertex outputs are not inputs.
        assert!(iface.attribute("world").is_none());
    }

    #[test]
    fn direct_parameter_attributes() {
        let vs = r#"
            @vertex
            fn vs_main(@location(1) uv: vec2<f32>, @location(0) vertex: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(vertex, 0.0, 1.0);
            }
        "#;
        let iface = ShaderInterface::parse(vs, "").unwrap();
        let attrs: Vec<(&str, u32)> = iface
            .attributes()
            .iter()
            .map(|a| (a.name.as_str(), a.location))
            .collect();
        assert_eq!(attrs, [("vertex", 0), ("uv", 1)]);
    }
}
