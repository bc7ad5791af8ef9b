// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use state_compress_cli::StateCompressApp;

fn main() -> Result<()> {
    color_eyre::install()?;
    let app = StateCompressApp::parse();
    app.exec()
}
