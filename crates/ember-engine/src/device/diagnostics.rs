//! Startup diagnostics.
//!
//! None of this affects behavior; it exists so a log from a user's machine says
//! which GPU, driver and limits the widget ended up with.

use std::fmt::Write;

pub(crate) fn log_adapter(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    log::info!(
        "adapter properties:\n - name: {}\n - vendor: {:#x}\n - device: {:#x}\n - type: {:?}\n - driver: {} {}\n - backend: {:?}",
        info.name,
        info.vendor,
        info.device,
        info.device_type,
        info.driver,
        info.driver_info,
        info.backend,
    );
    log::info!("adapter features: {:?}", adapter.features());
}

pub(crate) fn log_device(device: &wgpu::Device) {
    log::info!("device features: {:?}", device.features());

    let l = device.limits();
    log::info!(
        "device limits:\n - max_texture_dimension_1d: {}\n - max_texture_dimension_2d: {}\n - max_texture_dimension_3d: {}\n - max_texture_array_layers: {}\n - max_bind_groups: {}\n - max_dynamic_uniform_buffers_per_pipeline_layout: {}\n - max_dynamic_storage_buffers_per_pipeline_layout: {}\n - max_sampled_textures_per_shader_stage: {}\n - max_samplers_per_shader_stage: {}\n - max_storage_buffers_per_shader_stage: {}\n - max_storage_textures_per_shader_stage: {}\n - max_uniform_buffers_per_shader_stage: {}\n - max_uniform_buffer_binding_size: {}\n - max_storage_buffer_binding_size: {}\n - min_uniform_buffer_offset_alignment: {}\n - min_storage_buffer_offset_alignment: {}\n - max_vertex_buffers: {}\n - max_vertex_attributes: {}\n - max_vertex_buffer_array_stride: {}\n - max_compute_workgroup_storage_size: {}\n - max_compute_invocations_per_workgroup: {}\n - max_compute_workgroup_size: {}x{}x{}\n - max_compute_workgroups_per_dimension: {}",
        l.max_texture_dimension_1d,
        l.max_texture_dimension_2d,
        l.max_texture_dimension_3d,
        l.max_texture_array_layers,
        l.max_bind_groups,
        l.max_dynamic_uniform_buffers_per_pipeline_layout,
        l.max_dynamic_storage_buffers_per_pipeline_layout,
        l.max_sampled_textures_per_shader_stage,
        l.max_samplers_per_shader_stage,
        l.max_storage_buffers_per_shader_stage,
        l.max_storage_textures_per_shader_stage,
        l.max_uniform_buffers_per_shader_stage,
        l.max_uniform_buffer_binding_size,
        l.max_storage_buffer_binding_size,
        l.min_uniform_buffer_offset_alignment,
        l.min_storage_buffer_offset_alignment,
        l.max_vertex_buffers,
        l.max_vertex_attributes,
        l.max_vertex_buffer_array_stride,
        l.max_compute_workgroup_storage_size,
        l.max_compute_invocations_per_workgroup,
        l.max_compute_workgroup_size_x,
        l.max_compute_workgroup_size_y,
        l.max_compute_workgroup_size_z,
        l.max_compute_workgroups_per_dimension,
    );
}

pub(crate) fn log_surface_formats(formats: &[wgpu::TextureFormat]) {
    log::info!("{}", surface_format_list(formats));
}

fn surface_format_list(formats: &[wgpu::TextureFormat]) -> String {
    let mut out = String::from("supported surface formats:");
    for f in formats {
        let _ = write!(out, "\n - {f:?}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_formats_are_listed_one_per_line() {
        let list = surface_format_list(&[
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]);
        assert_eq!(
            list,
            "supported surface formats:\n - Bgra8Unorm\n - Rgba8UnormSrgb"
        );
    }
}
