use std::time::Duration;

/// Render-loop configuration.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// MSAA sample count for color, depth and pipeline. 1 disables MSAA.
    pub sample_count: u32,

    /// Color the main pass clears to.
    pub clear_color: wgpu::Color,

    /// Target interval between timer ticks (~60 Hz by default).
    pub frame_interval: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            sample_count: 4,
            clear_color: wgpu::Color {
                r: 0.235,
                g: 0.235,
                b: 0.235,
                a: 1.0,
            },
            frame_interval: Duration::from_millis(16),
        }
    }
}
