//! Memtest command implementation

use super::{item_progress, Flash};
use crate::error::CliError;
use s25fl_core::memtest::raw_memtest;

/// Run the raw flash self-test over `count` sectors starting at `first`
pub fn run_memtest(flash: &mut Flash<'_>, first: u32, count: u32) -> Result<(), CliError> {
    let end = first.saturating_add(count);

    println!("Testing sectors {}..{}", first, end);
    let pb = item_progress(count as u64, "sectors")?;
    let fault = raw_memtest(flash, first..end, |_| pb.inc(1))?;
    pb.finish();

    match fault {
        Some(fault) => Err(fault.into()),
        None => {
            println!("Memtest passed");
            Ok(())
        }
    }
}
