#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use clap::Parser;

pub mod cli;
pub mod flags;
pub mod telemetry;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
