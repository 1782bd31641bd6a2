//! GLSL front end and interface reflection through `naga`.

use wgpu::naga;

use crate::backend::ShaderStage;

/// A vertex attribute as declared by the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VertexInput {
    pub name: String,
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Texture,
    Sampler,
    Other,
}

/// A bound global (`layout(set, binding)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resource {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates one stage. Errors are rendered against `source`.
pub(crate) fn parse_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, String> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(naga_stage(stage));
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| errors.emit_to_string(source))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|error| error.emit_to_string(source))?;

    if !module
        .entry_points
        .iter()
        .any(|entry| entry.stage == naga_stage(stage))
    {
        return Err(format!("no {stage} entry point"));
    }
    Ok(module)
}

/// Location-bound inputs of the vertex entry point, in declaration order.
pub(crate) fn vertex_inputs(module: &naga::Module) -> Result<Vec<VertexInput>, String> {
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga::ShaderStage::Vertex)
        .ok_or_else(|| "no vertex entry point".to_owned())?;

    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        let Some(naga::Binding::Location { location, .. }) = &argument.binding else {
            continue;
        };
        let name = argument.name.clone().unwrap_or_default();
        let format = vertex_format(&module.types[argument.ty].inner)
            .ok_or_else(|| format!("attribute `{name}` is not a 32-bit float scalar or vector"))?;
        inputs.push(VertexInput {
            name,
            location: *location,
            format,
        });
    }
    Ok(inputs)
}

fn vertex_format(inner: &naga::TypeInner) -> Option<wgpu::VertexFormat> {
    use naga::{ScalarKind, TypeInner, VectorSize};

    match *inner {
        TypeInner::Scalar(scalar) if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(wgpu::VertexFormat::Float32)
        }
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(match size {
                VectorSize::Bi => wgpu::VertexFormat::Float32x2,
                VectorSize::Tri => wgpu::VertexFormat::Float32x3,
                VectorSize::Quad => wgpu::VertexFormat::Float32x4,
            })
        }
        _ => None,
    }
}

/// Every global with a resource binding.
pub(crate) fn resources(module: &naga::Module) -> Vec<Resource> {
    module
        .global_variables
        .iter()
        .filter_map(|(_, variable)| {
            let binding = variable.binding.as_ref()?;
            let kind = match module.types[variable.ty].inner {
                naga::TypeInner::Image { .. } => ResourceKind::Texture,
                naga::TypeInner::Sampler { .. } => ResourceKind::Sampler,
                _ => ResourceKind::Other,
            };
            Some(Resource {
                name: variable.name.clone().unwrap_or_default(),
                group: binding.group,
                binding: binding.binding,
                kind,
            })
        })
        .collect()
}

/// Number of float components a vertex format carries.
pub(crate) fn components(format: wgpu::VertexFormat) -> u32 {
    match format {
        wgpu::VertexFormat::Float32 => 1,
        wgpu::VertexFormat::Float32x2 => 2,
        wgpu::VertexFormat::Float32x3 => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{LUMA_FRAGMENT_GLSL, QUAD_VERTEX_GLSL};

    #[test]
    fn builtin_vertex_stage_exposes_both_attributes() {
        let module = parse_glsl(ShaderStage::Vertex, QUAD_VERTEX_GLSL).unwrap();
        let inputs = vertex_inputs(&module).unwrap();

        assert_eq!(
            inputs,
            vec![
                VertexInput {
                    name: "a_position".into(),
                    location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                VertexInput {
                    name: "a_texCoord".into(),
                    location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ]
        );
    }

    #[test]
    fn builtin_fragment_stage_binds_texture_and_sampler() {
        let module = parse_glsl(ShaderStage::Fragment, LUMA_FRAGMENT_GLSL).unwrap();
        let mut found = resources(&module);
        found.sort_by_key(|resource| resource.binding);

        assert_eq!(
            found,
            vec![
                Resource {
                    name: "u_texture".into(),
                    group: 0,
                    binding: 0,
                    kind: ResourceKind::Texture,
                },
                Resource {
                    name: "u_sampler".into(),
                    group: 0,
                    binding: 1,
                    kind: ResourceKind::Sampler,
                },
            ]
        );
    }

    #[test]
    fn syntax_errors_produce_a_log() {
        let err = parse_glsl(
            ShaderStage::Fragment,
            "#version 450\nvoid main() { outColor = ; }\n",
        )
        .unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn component_counts_follow_formats() {
        assert_eq!(components(wgpu::VertexFormat::Float32), 1);
        assert_eq!(components(wgpu::VertexFormat::Float32x2), 2);
        assert_eq!(components(wgpu::VertexFormat::Float32x4), 4);
    }
}
