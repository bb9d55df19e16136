//! Offline file name → URL resolution.

use crate::output::Printer;
use anyhow::Result;
use std::io::Write;
use wikilisten_core::AssetResolver;

pub fn resolve<W: Write>(
    resolver: &AssetResolver,
    filenames: &[String],
    printer: &mut Printer<W>,
) -> Result<()> {
    for filename in filenames {
        printer.asset(&resolver.reference(filename))?;
    }
    Ok(())
}
