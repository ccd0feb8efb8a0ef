use crate::exit_codes::EXIT_SUCCESS;
use steprun_core::report::FORMATTERS;

pub fn run() -> anyhow::Result<i32> {
    let width = FORMATTERS.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for spec in FORMATTERS {
        let mode = if spec.concurrent {
            "concurrent"
        } else {
            "sequential only"
        };
        println!("{:<width$}  {} ({mode})", spec.name, spec.description);
    }
    Ok(EXIT_SUCCESS)
}
