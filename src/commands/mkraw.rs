//! Write test-pattern sector files for exercising the codec.

use std::str::FromStr;
use log::info;
use crate::patterns::{self,Pattern};
use crate::STDRESULT;
use super::CommandError;

const RCH: &str = "unreachable was reached";

pub fn mkraw(cmd: &clap::ArgMatches) -> STDRESULT {
    let pattern = Pattern::from_str(cmd.get_one::<String>("pattern").expect(RCH))?;
    let count = *cmd.get_one::<u32>("count").expect(RCH) as usize;
    let output = cmd.get_one::<String>("output").expect(RCH);
    if count==0 {
        eprintln!("sector count must be positive");
        return Err(Box::new(CommandError::OutOfRange));
    }
    std::fs::write(output,patterns::generate(pattern,count))?;
    info!("wrote {} pattern sectors to {}",count,output);
    Ok(())
}
