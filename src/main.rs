use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hitron_exporter::credentials::CommandCredentialSource;
use hitron_exporter::probe::Prober;
use hitron_exporter::server::run_server;

#[derive(Parser)]
#[command(name = "hitron-exporter")]
#[command(about = "Prometheus exporter for Hitron cable modems")]
#[command(version)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "HITRON_EXPORTER_LISTEN", default_value = "127.0.0.1:9938")]
    listen: String,

    /// Command that turns `{"service": ..}` on stdin into `{"usr": .., "pwd": ..}` on stdout.
    /// Needed for probes that pass `ipa_vault_namespace`.
    #[arg(long, env = "HITRON_EXPORTER_CREDENTIAL_COMMAND")]
    credential_command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut prober = Prober::new();
    if let Some(line) = cli.credential_command.as_deref() {
        prober = prober.with_credential_source(Arc::new(CommandCredentialSource::from_command_line(line)?));
    }

    let listener = TcpListener::bind(&cli.listen).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    run_server(listener, prober).await?;
    Ok(())
}
