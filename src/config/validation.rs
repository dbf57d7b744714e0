use super::defaults::{
    MAX_CHUNK, MAX_HANG_DELAY_SECS, MAX_SAVERECS, MAX_THRESHOLD, MAX_TICK_MS, MIN_CHUNK,
    MIN_THRESHOLD, MIN_TICK_MS,
};
use super::{AppConfig, RunCommand};
use anyhow::{bail, Context, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the output directory.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_CHUNK..=MAX_CHUNK).contains(&self.chunk) {
            bail!(
                "--chunk must be between {MIN_CHUNK} and {MAX_CHUNK} samples, got {}",
                self.chunk
            );
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.threshold) {
            bail!(
                "--threshold must be between {MIN_THRESHOLD} and {MAX_THRESHOLD}, got {}",
                self.threshold
            );
        }
        if self.saverecs > MAX_SAVERECS {
            bail!(
                "--saverecs must be between 0 and {MAX_SAVERECS}, got {}",
                self.saverecs
            );
        }
        if self.hangdelay > MAX_HANG_DELAY_SECS {
            bail!(
                "--hangdelay must be between 0 and {MAX_HANG_DELAY_SECS} seconds, got {}",
                self.hangdelay
            );
        }
        if !(MIN_TICK_MS..=MAX_TICK_MS).contains(&self.tick_ms) {
            bail!(
                "--tick-ms must be between {MIN_TICK_MS} and {MAX_TICK_MS}, got {}",
                self.tick_ms
            );
        }

        // Listing devices never writes files, so the output dir is irrelevant there.
        if self.command == RunCommand::Record {
            let canonical = self.output_dir.canonicalize().with_context(|| {
                format!(
                    "--output-dir '{}' does not exist",
                    self.output_dir.display()
                )
            })?;
            if !canonical.is_dir() {
                bail!("--output-dir '{}' is not a directory", canonical.display());
            }
            self.output_dir = canonical;
        }

        Ok(())
    }
}
