//! Built-in shader pair for the textured full-screen quad.

/// Vertex stage: passes clip-space positions through and forwards the
/// texture coordinate.
pub const QUAD_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_texCoord;

layout(location = 0) out vec2 v_texCoord;

void main() {
    v_texCoord = a_texCoord;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Fragment stage: samples the single-channel edge map and replicates it
/// across RGB.
pub const LUMA_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_texCoord;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D u_texture;
layout(set = 0, binding = 1) uniform sampler u_sampler;

void main() {
    float luma = texture(sampler2D(u_texture, u_sampler), v_texCoord).r;
    outColor = vec4(vec3(luma), 1.0);
}
";

pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const TEX_COORD_ATTRIBUTE: &str = "a_texCoord";
pub const TEXTURE_UNIFORM: &str = "u_texture";

/// Full-screen quad as a four-vertex triangle strip.
pub const QUAD_POSITIONS: [f32; 8] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    1.0, 1.0,
];

/// Texture coordinates for [`QUAD_POSITIONS`], flipped vertically so the
/// frame's first row lands at the top of the screen.
pub const QUAD_TEX_COORDS: [f32; 8] = [
    0.0, 1.0, //
    1.0, 1.0, //
    0.0, 0.0, //
    1.0, 0.0,
];
