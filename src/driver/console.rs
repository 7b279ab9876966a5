use std::io::{self, Read};

use tracing::info;

use crate::{driver::render_loop::RenderLoopDriver, trace::DRIVER};

/// Console key commands understood by [`run_console`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Quit,
}

impl Command {
    pub fn from_key(key: u8) -> Option<Self> {
        match key.to_ascii_uppercase() {
            b'S' => Some(Self::Toggle),
            b'Q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Read single keys from `input` until `Q` or end of input. `S` starts a stopped driver and
/// stops a running one; every other byte is ignored.
pub fn run_console(driver: &RenderLoopDriver, input: impl Read) -> io::Result<()> {
    for byte in input.bytes() {
        match Command::from_key(byte?) {
            Some(Command::Toggle) if driver.running() => driver.stop(),
            Some(Command::Toggle) => driver.start(),
            Some(Command::Quit) => {
                info!(target: DRIVER, "quit requested");
                return Ok(());
            }
            None => {}
        }
    }
    info!(target: DRIVER, "input closed");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/driver/console.rs"]
mod tests;
