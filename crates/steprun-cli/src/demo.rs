//! Built-in step library used by the `steprun` binary.
//!
//! Every feature runs start to finish on one thread, so per-thread state is
//! enough to carry values between the steps of a scenario.

use std::cell::{Cell, RefCell};
use steprun_core::arg::ArgsExt;
use steprun_core::errors::RegistryError;
use steprun_core::{Arg, StepError, StepResult, Suite};

thread_local! {
    static GODOGS: Cell<i64> = const { Cell::new(0) };
    static NOTES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn there_are_godogs(args: &[Arg]) -> StepResult {
    let available = args.arg(0)?.as_i64()?;
    GODOGS.with(|g| g.set(available));
    Ok(())
}

fn i_eat(args: &[Arg]) -> StepResult {
    let num = args.arg(0)?.as_i64()?;
    let available = GODOGS.with(Cell::get);
    if num > available {
        return Err(StepError::failed(format!(
            "you cannot eat {num} godogs, there are {available} available"
        )));
    }
    GODOGS.with(|g| g.set(available - num));
    Ok(())
}

fn there_should_be_remaining(args: &[Arg]) -> StepResult {
    let expected = args.arg(0)?.as_i64()?;
    let actual = GODOGS.with(Cell::get);
    if expected != actual {
        return Err(StepError::failed(format!(
            "expected {expected} godogs to be remaining, but there is {actual}"
        )));
    }
    Ok(())
}

fn the_notes(args: &[Arg]) -> StepResult {
    let table = args.arg(0)?.as_table()?;
    let rows = table.iter().skip(1).filter_map(|row| row.first().cloned());
    NOTES.with(|n| n.borrow_mut().extend(rows));
    Ok(())
}

fn a_doc_string_containing(args: &[Arg]) -> StepResult {
    let needle = args.arg(0)?.as_str()?;
    let body = args.arg(1)?.as_str()?;
    if body.contains(needle) {
        Ok(())
    } else {
        Err(StepError::failed(format!("doc string does not contain \"{needle}\"")))
    }
}

fn there_should_be_notes(args: &[Arg]) -> StepResult {
    let expected = usize::try_from(args.arg(0)?.as_i64()?).map_err(anyhow::Error::from)?;
    let actual = NOTES.with(|n| n.borrow().len());
    if expected == actual {
        Ok(())
    } else {
        Err(StepError::failed(format!("expected {expected} notes, found {actual}")))
    }
}

/// Suite with the demo step definitions registered.
pub fn suite(name: &str) -> Result<Suite, RegistryError> {
    let mut suite = Suite::new(name);
    suite
        .step(r"^there are (\d+) godogs$", there_are_godogs)?
        .step(r"^I eat (\d+)$", i_eat)?
        .step(r"^there should be (\d+) remaining$", there_should_be_remaining)?
        .step(r"^the following notes:$", the_notes)?
        .step(r#"^a doc string containing "([^"]*)":$"#, a_doc_string_containing)?
        .step(r"^there should be (\d+) notes$", there_should_be_notes)?
        .step(r"^the notes are cleared$", |_| {
            NOTES.with(|n| n.borrow_mut().clear());
            Ok(())
        })?
        .step(r"^a pending step$", |_| steprun_core::pending())?
        .step(r"^a failing step$", |_| Err(StepError::failed("intentional failure")))?
        .step(r"^a panicking step$", |_| panic!("intentional panic"))?;
    Ok(suite)
}
