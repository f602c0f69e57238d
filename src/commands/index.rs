//! Build the reference index without mapping any samples.

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use log::info;

use refmap_lib::config::BatchConfig;
use refmap_lib::pipeline::{IndexStatus, MappingPipeline};
use refmap_lib::process::SystemRunner;

use crate::commands::command::Command;
use crate::commands::common::{ReferenceOptions, ThreadingOptions};

/// Build the reference index.
#[derive(Debug, Parser)]
#[command(
    name = "index",
    about = "\x1b[38;5;72m[MAPPING]\x1b[0m        \x1b[36mBuild the aligner index for a reference\x1b[0m",
    long_about = r#"
Build the aligner index for the single reference FASTA in a directory.

Nothing is run if the index already exists. Tool output written to stderr is
kept in <reference dir>/<analysis type>_bowtie_index.log (or _bwa_index.log).

Example usage:
  refmap index -r refs/ -t 8
"#
)]
pub struct Index {
    #[command(flatten)]
    pub reference: ReferenceOptions,

    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for Index {
    fn execute(&self) -> Result<()> {
        let config = BatchConfig::for_index(
            &self.reference.reference_path,
            self.threading.num_threads()?,
            self.reference.aligner,
            &self.reference.analysis_type,
        )?;
        info!("Reference: {}", config.reference.display());
        let log_path = config.index_log_path();

        match MappingPipeline::new(config, Arc::new(SystemRunner)).build_index() {
            IndexStatus::Failed => bail!("Index build failed; see {}", log_path.display()),
            status => info!("Reference index {status}"),
        }
        Ok(())
    }
}
