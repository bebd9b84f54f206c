mod app;
mod backend;
mod cli;
mod domain;
mod infra;
#[cfg(test)]
mod test_support;
mod ui;
mod usecases;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    infra::secrets::install_panic_redaction_hook();
    app::run(cli::Cli::parse())
}
