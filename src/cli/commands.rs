use clap::{Arg, ArgAction, ArgMatches, Command};
use log::info;

use crate::config::{Config, ConfigError};

pub fn build_cli() -> Command {
    Command::new("water-consumption")
        .version(crate::VERSION)
        .about("Customer and monthly water consumption records over HTTP")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("HTTP listen port (overrides PORT)"),
        )
        .arg(
            Arg::new("database-url")
                .long("database-url")
                .value_name("URL")
                .help("PostgreSQL connection string (overrides DATABASE_URL)"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Print the resolved configuration and exit"),
        )
}

// Returns true when a command was handled and the server should not start
pub fn handle_commands(matches: &ArgMatches, config: &Config) -> Result<bool, ConfigError> {
    if matches.get_flag("print-config") {
        info!("📋 Printing resolved configuration");
        println!("{}", config.redacted().to_toml()?);
        return Ok(true);
    }

    Ok(false)
}
