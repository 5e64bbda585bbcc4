use ember_engine::device::GpuInit;
use ember_engine::frame::FrameConfig;
use ember_engine::logging::{LoggingConfig, init_logging};
use ember_engine::window::{Runtime, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "ember viewer".to_string(),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), FrameConfig::default()).inspect_err(|e| {
        log::error!("ember runtime error: {e:#}");
    })
}
