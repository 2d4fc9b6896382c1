//! Load, configure and expose sequences.

use super::{make_bitstring, BoardError, Identifier};
use crate::session::{expand_path, LoadOptions, Session, SessionError};
use crate::settings::{Compression, ImageType, SettingsError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Parameter that shifts one bit into the board's serial register.
const BIT_LEVEL_PARAM: &str = "BitLevel";
/// Trailing bits written after the four routing words.
const JUNK_BITS: &str = "0100";

/// Writes a bitstring to the serial register, rightmost bit first.
///
/// Each bit is sent as `setp BitLevel <bit + 1>`.
pub async fn write_bits(session: &mut Session, bits: &str) -> Result<(), SessionError> {
    let levels = bits
        .chars()
        .rev()
        .map(|c| match c {
            '0' => Ok(1u8),
            '1' => Ok(2u8),
            other => Err(BoardError::InvalidBit(other)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(bits, "Writing bits");
    for level in levels {
        session.set_param(BIT_LEVEL_PARAM, level).await?;
    }
    Ok(())
}

/// Settings for a magic board run.
#[derive(Debug, Clone)]
pub struct MagicboardRun {
    /// ACF file to load first. Skipped when absent or not a file.
    pub acf_file: Option<PathBuf>,
    /// Positive input, from the board's perspective.
    pub p_in: Identifier,
    /// Negative input.
    pub n_in: Identifier,
    /// Positive output.
    pub p_out: Identifier,
    /// Negative output.
    pub n_out: Identifier,
    /// Exposures to take.
    pub iterations: u32,
    /// Read out in correlated double-sampling mode instead of raw.
    pub read_cds: bool,
    /// Log how long the register writes took.
    pub timeit: bool,
    /// Wait between loading and the first register write.
    pub delay: Duration,
}

/// Settings for a plain test run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// ACF file to load first. Skipped when absent or not a file.
    pub acf_file: Option<PathBuf>,
    /// Exposures to take.
    pub iterations: u32,
    /// Load in `DEFAULT` (CDS) mode instead of `RAW`.
    pub read_cds: bool,
    /// Exposure time in seconds.
    pub exptime: f64,
    /// Log the elapsed time.
    pub timeit: bool,
    /// Image base name.
    pub basename: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            acf_file: None,
            iterations: 1,
            read_cds: false,
            exptime: 0.0,
            timeit: false,
            basename: "zztf".to_string(),
        }
    }
}

fn readout_mode(read_cds: bool) -> &'static str {
    if read_cds {
        "DEFAULT"
    } else {
        "RAW"
    }
}

fn existing_file(path: Option<&Path>) -> Option<PathBuf> {
    path.and_then(|p| expand_path(p).ok()).filter(|p| p.is_file())
}

/// Shared preamble: optional ACF load, TEST type, basename.
async fn prepare(
    session: &mut Session,
    acf_file: Option<&Path>,
    read_cds: bool,
    basename: &str,
) -> Result<(), SessionError> {
    session.set_compression(Compression::None, None);

    if let Some(acf) = existing_file(acf_file) {
        if let Err(e) = session.load(&acf, LoadOptions::with_mode(readout_mode(read_cds))).await {
            tracing::error!(acf = %acf.display(), error = %e, "Load failed");
            return Err(e);
        }
    }
    session.set_type(ImageType::Test);
    session.set_basename(basename).await
}

/// Configures the magic board routing, then exposes.
pub async fn magicboard(session: &mut Session, run: &MagicboardRun) -> Result<(), SessionError> {
    if run.iterations == 0 {
        return Err(SettingsError::InvalidIterations.into());
    }
    prepare(session, run.acf_file.as_deref(), run.read_cds, "zzmagic").await?;

    // long startup sequences need time to settle
    if !run.delay.is_zero() {
        tokio::time::sleep(run.delay).await;
    }

    let started = Instant::now();
    let words = [
        make_bitstring(run.p_in),
        make_bitstring(run.n_in),
        make_bitstring(run.p_out),
        make_bitstring(run.n_out),
        JUNK_BITS.to_string(),
    ];
    for bits in &words {
        write_bits(session, bits).await?;
    }
    if run.timeit {
        let count: usize = words.iter().map(String::len).sum();
        tracing::info!(bits = count, elapsed = ?started.elapsed(), "Wrote register bits");
    }

    session.expose(0.0, run.iterations).await
}

/// Loads (optionally), names and takes test exposures.
///
/// All exposures of one run go into the same FITS file.
pub async fn run(session: &mut Session, options: &RunOptions) -> Result<(), SessionError> {
    if options.iterations == 0 {
        return Err(SettingsError::InvalidIterations.into());
    }
    let started = Instant::now();
    prepare(
        session,
        options.acf_file.as_deref(),
        options.read_cds,
        &options.basename,
    )
    .await?;

    session.expose(options.exptime, options.iterations).await?;

    if options.timeit {
        tracing::info!(elapsed = ?started.elapsed(), "Run completed");
    }
    Ok(())
}
