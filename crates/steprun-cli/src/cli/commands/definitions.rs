use crate::demo;
use crate::exit_codes::EXIT_SUCCESS;
use std::io::Write;

pub fn run() -> anyhow::Result<i32> {
    let suite = demo::suite("steprun")?;
    let mut out = std::io::stdout().lock();
    suite.registry().write_definitions(&mut out)?;
    out.flush()?;
    Ok(EXIT_SUCCESS)
}
