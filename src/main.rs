use anyhow::Result;
use loop_image_pipeline::orchestrator::App;
use loop_image_pipeline::utils::logging;
use loop_image_pipeline::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置（文件可选，环境变量可覆盖）
    let config = Config::load("config/pipeline.toml")?;

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
