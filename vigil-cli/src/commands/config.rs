use anyhow::Result;
use owo_colors::OwoColorize;
use vigil_core::config::VigilConfig;

pub fn run(config: &VigilConfig) -> Result<()> {
    let config_path = VigilConfig::config_path()?;
    let tz = config.timezone()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Schedule:   {}", config.schedule_path()?.display());
    println!("  Reminders:  {}", config.reminders_path()?.display());

    println!();
    println!("{}", "Settings".bold());
    println!("  Time zone:  {}", tz.name());
    println!("  Log level:  {}", config.log_level);
    if let Some(owner) = &config.owner_name {
        println!("  Owner:      {}", owner);
    }

    Ok(())
}
