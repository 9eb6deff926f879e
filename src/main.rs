use diorama::{config::SceneConfig, logging, DioramaApp};

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = SceneConfig::from_env();
    log::info!("Loading assets from {}", config.assets.root.display());

    DioramaApp::new(config)?.run()
}
