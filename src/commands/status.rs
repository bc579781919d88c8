//! Status command implementation

use super::Flash;
use crate::error::CliError;
use s25fl_core::protocol;
use s25fl_core::register::ErrorStatus;

/// Print the status registers, then read and clear the error flags
pub fn run_status(flash: &mut Flash<'_>) -> Result<(), CliError> {
    let sr1 = flash.status()?;
    let sr2 = protocol::read_status2(flash.transport_mut())?;
    let cr2 = protocol::read_config2(flash.transport_mut())?;

    println!("SR1: 0x{:02X} {:?}", sr1.bits(), sr1);
    println!("SR2: 0x{:02X} {:?}", sr2.bits(), sr2);
    println!("CR2: 0x{:02X} {:?}", cr2.bits(), cr2);

    let errors = flash.error_status()?;
    if errors.is_empty() {
        println!("No program or erase errors");
    } else {
        if errors.contains(ErrorStatus::PROGRAM) {
            println!("Program error flagged (cleared)");
        }
        if errors.contains(ErrorStatus::ERASE) {
            println!("Erase error flagged (cleared)");
        }
    }
    Ok(())
}
