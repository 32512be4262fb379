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

//! Minimal PDF layout engine for the energy report.

pub mod builder;
pub mod document;
pub mod fonts;
pub mod logo;

pub use builder::{ChartBar, EnergyPdfBuilder, PdfLabels, TableConfig};
pub use document::{PdfDocument, Rgb};
pub use logo::{PdfImage, load_logo};
