// src/main.rs

use xrun::{cli, load_config, logging, project_root, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("xrun error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let root = project_root()?;
    let config = load_config(&root)?;
    logging::init_logging(config.mode)?;
    run(args, root, config).await?;
    Ok(())
}
