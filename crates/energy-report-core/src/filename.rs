// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Output file naming. Every report gets a random suffix and files are created with
//! `create_new`, so an existing report is never overwritten.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use energy_report_i18n::Language;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{ReportError, ReportResult};
use crate::period::DateWindow;

pub const DEFAULT_FILENAME_PATTERN: &str = "energy_report_{start}_{end}_{language}.pdf";

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 4;
const MAX_ATTEMPTS: usize = 64;

/// Base file name (without the random suffix) for a report
///
/// An explicit name wins over the pattern. `{language}`, `{start}` and `{end}` are
/// replaced in both.
#[must_use]
pub fn build_base_filename(
    pattern: &str,
    explicit: Option<&str>,
    language: Language,
    window: &DateWindow,
) -> String {
    let template = explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(pattern);

    let expanded = template
        .replace("{language}", language.code())
        .replace("{start}", &window.start.format("%Y-%m-%d").to_string())
        .replace("{end}", &window.end.format("%Y-%m-%d").to_string());

    ensure_pdf_extension(&sanitize(&expanded))
}

/// Insert `_xxxx` before the extension
#[must_use]
pub fn with_random_suffix<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())]))
        .collect();

    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{suffix}.{extension}"),
        _ => format!("{name}_{suffix}"),
    }
}

/// First suffixed path in `dir` that does not exist yet
///
/// # Errors
///
/// Returns `ReportError::Io` when no free name was found.
pub fn reserve_unique_path(dir: &Path, base: &str) -> ReportResult<PathBuf> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ATTEMPTS {
        let candidate = dir.join(with_random_suffix(base, &mut rng));
        if !candidate.exists() {
            return Ok(candidate);
        }
        debug!("Report name {} taken, retrying", candidate.display());
    }
    Err(exhausted(dir))
}

/// Write `bytes` to a new suffixed file in `dir`, retrying when a name is taken
///
/// # Errors
///
/// Returns `ReportError::Io` on write failures or when no free name was found.
pub fn write_unique(dir: &Path, base: &str, bytes: &[u8]) -> ReportResult<PathBuf> {
    write_unique_with(dir, base, |file| {
        file.write_all(bytes)?;
        file.sync_all()
    })
}

/// Create a new suffixed file and let `fill` write it; a failed file is removed
fn write_unique_with(
    dir: &Path,
    base: &str,
    fill: impl Fn(&mut File) -> std::io::Result<()>,
) -> ReportResult<PathBuf> {
    for _ in 0..MAX_ATTEMPTS {
        let path = reserve_unique_path(dir, base)?;
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = fill(&mut file) {
                    drop(file);
                    if let Err(cleanup) = std::fs::remove_file(&path) {
                        warn!(
                            "⚠️ [REPORT] Could not remove partial {}: {cleanup}",
                            path.display()
                        );
                    }
                    return Err(e.into());
                }
                return Ok(path);
            }
            // Lost a race with another writer
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(exhausted(dir))
}

fn exhausted(dir: &Path) -> ReportError {
    ReportError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free report file name in {}", dir.display()),
    ))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_owned();
    if cleaned.is_empty() {
        "energy_report".to_owned()
    } else {
        cleaned
    }
}

fn ensure_pdf_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name.to_owned()
    } else {
        format!("{name}.pdf")
    }
}
