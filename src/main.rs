use clap::Parser;
use sysexits::ExitCode;
use volume_proxy::cmd::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cmd::proxy(cli).await
}
