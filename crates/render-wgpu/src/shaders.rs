/// WGSL shader for lit solid meshes: boxes, spheres and the floor plane.
///
/// Lambert shading with one ambient term, one directional light and up to
/// `MAX_POINT_LIGHTS` point lights with a smooth distance cutoff.
pub const LIT_SHADER: &str = r#"
const PI: f32 = 3.14159265;

struct Uniforms {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    point_pos: array<vec4<f32>, 4>,
    point_color: array<vec4<f32>, 4>,
    counts: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    // Normals are axis-aligned or the scale is uniform, so the model matrix
    // only changes their length.
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    var irradiance = uniforms.ambient.rgb;
    irradiance += uniforms.sun_color.rgb * max(dot(n, uniforms.sun_dir.xyz), 0.0);

    for (var i = 0u; i < uniforms.counts.x; i++) {
        let to_light = uniforms.point_pos[i].xyz - in.world_pos;
        let d = max(length(to_light), 0.0001);
        let cutoff = uniforms.point_pos[i].w;
        var falloff = 1.0 / max(d * d, 0.01);
        if (cutoff > 0.0) {
            let r = clamp(1.0 - pow(d / cutoff, 4.0), 0.0, 1.0);
            falloff *= r * r;
        }
        irradiance += uniforms.point_color[i].rgb * falloff * max(dot(n, to_light / d), 0.0);
    }

    return vec4<f32>(in.color.rgb * irradiance / PI, in.color.a);
}
"#;

/// WGSL shader for wireframe boxes: flat colour with alpha.
pub const WIRE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct WireOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_wire(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>, instance: InstanceInput) -> WireOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: WireOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(position, 1.0);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_wire(in: WireOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
