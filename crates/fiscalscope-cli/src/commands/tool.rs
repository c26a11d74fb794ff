//! Tool command - invoke an agent tool and print its text.

use std::path::PathBuf;

use fiscalscope::{FiscalScope, ToolRegistry};

use super::{load, CommandResult};

pub fn run(scope: &FiscalScope, file: PathBuf, name: String, input: String) -> CommandResult {
    let dataset = load(scope, &file, true)?;
    let mut session = scope.session(dataset);
    println!("{}", ToolRegistry::new().invoke(&mut session, &name, &input));
    Ok(())
}
