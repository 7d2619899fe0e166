use anyhow::Result;
use owo_colors::OwoColorize;
use vigil_core::preset::SchedulePreset;

use crate::render::Render;

pub fn run() -> Result<()> {
    for (i, preset) in SchedulePreset::ALL.iter().enumerate() {
        println!(
            "{} {}",
            preset.title().bold(),
            format!("(vigil init --preset {})", preset.name()).dimmed()
        );
        println!("   {}", preset.description());

        for rule in preset.rules()? {
            println!("   {}", rule.render());
        }

        if i < SchedulePreset::ALL.len() - 1 {
            println!();
        }
    }

    Ok(())
}
