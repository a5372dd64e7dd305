use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csrkit::config::IssuanceConfig;
use csrkit::error::CsrKitError;
use csrkit::issue::issue;
use csrkit::key::Cipher;
use csrkit::logging::initialize_logging;
use csrkit::output::{ArtifactPaths, write_artifacts};
use tracing::{error, info, warn};

/// Generates a 4096-bit RSA key and a certificate signing request for it.
#[derive(Debug, Parser)]
#[command(name = "csrgen", version)]
struct Cli {
    /// Subject common name. Overrides `cn` from the configuration file.
    #[arg(long)]
    cn: Option<String>,

    /// Use the RSA cipher.
    #[arg(long, conflicts_with = "ecc")]
    rsa: bool,

    /// Use the ECC cipher (not supported yet).
    #[arg(long)]
    ecc: bool,

    /// YAML configuration with `dn`, `ku` and `eku`.
    #[arg(long, default_value = "conf/config.yaml")]
    config: PathBuf,

    /// Directory receiving `rsa.csr` and `rsa.key`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    fn cipher(&self) -> Option<Cipher> {
        match (self.rsa, self.ecc) {
            (true, _) => Some(Cipher::Rsa),
            (false, true) => Some(Cipher::Ecc),
            (false, false) => None,
        }
    }

    fn load_config(&self) -> Result<IssuanceConfig, CsrKitError> {
        let mut config = match IssuanceConfig::from_optional_path(&self.config)? {
            Some(config) => config,
            None => {
                warn!(config = %self.config.display(), "configuration file not found, using defaults");
                IssuanceConfig::default()
            }
        };

        if let Some(cn) = &self.cn {
            config.common_name = cn.clone();
        }
        if let Some(cipher) = self.cipher() {
            config.cipher = cipher;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<(), CsrKitError> {
    if cli.cipher().is_none() {
        warn!("no cipher selected, pass --rsa or --ecc; nothing issued");
        return Ok(());
    }

    let config = cli.load_config()?;
    info!(
        cn = %config.common_name,
        ku = ?config.ku,
        eku = ?config.eku,
        cipher = %config.cipher,
        "issuing certificate signing request"
    );

    let issued = issue(config)?;
    let paths = ArtifactPaths::in_dir(&cli.out_dir);
    write_artifacts(&issued, &paths)?;

    info!(
        csr = %paths.csr.display(),
        key = %paths.key.display(),
        "wrote certificate signing request and private key"
    );
    Ok(())
}

fn main() -> ExitCode {
    initialize_logging("CSRGEN_LOG");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "failed to issue certificate signing request");
            ExitCode::FAILURE
        }
    }
}
