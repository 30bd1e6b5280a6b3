use anyhow::Context;
use keeper_domain::config::ApiConfig;
use keeper_kernel::config::load_config;
use keeper_logger::Logger;
use keeper_server::Server;

fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    let _log = Logger::builder(env!("CARGO_PKG_NAME")).config(&cfg.logging).init()?;

    keeper_runtime::build(&cfg.runtime)?
        .block_on(async move { Server::builder().config(cfg).build().await?.run().await })
}
