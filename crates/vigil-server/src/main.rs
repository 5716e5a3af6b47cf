use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use vigil_config::ConfigLoader;
use vigil_logging::init_logging;
use vigil_server::VigilApp;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding global.toml and alerts.toml
    #[arg(short, long, default_value = "config")]
    config_dir: PathBuf,

    /// Run a single alert now, print its execution and exit
    #[arg(long, value_name = "ALERT_ID")]
    once: Option<String>,

    /// Overrides `[logging] level`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new(&args.config_dir);
    let global = loader.load_global()?;
    let logging = match args.log_level {
        Some(level) => global.logging.clone().with_level(level),
        None => global.logging.clone(),
    };
    init_logging(&logging)?;

    let alerts = loader.load_alerts()?;
    info!(
        config_dir = %loader.config_dir().display(),
        alerts = alerts.len(),
        "Starting {} {}",
        global.system.name,
        global.system.version
    );

    let app = VigilApp::build(global, alerts).await?;

    match args.once {
        Some(alert_id) => {
            let execution = app
                .run_once(&alert_id)
                .await
                .ok_or_else(|| anyhow!("Alert {} is already running", alert_id))?;
            println!("{}", serde_json::to_string_pretty(&execution)?);
            app.shutdown().await
        }
        None => app.run().await,
    }
}
