//! `config`: show the effective configuration

use anyhow::Result;

use crate::output;
use crate::settings::{Overrides, Settings};

pub fn execute(settings: Settings, overrides: &Overrides, json: bool, yaml: bool) -> Result<()> {
    let settings = settings.apply(overrides);
    settings.validate()?;
    if yaml && !json {
        output::print_settings_yaml(&settings)?;
    } else {
        output::print_settings(&settings, json);
    }
    Ok(())
}
