//! `smash-config` - settings and topology for Pulp functional test suites
//!
//! This library validates the Pulp Smash settings document, resolves it into
//! a topology of hosts and roles, and decides how each host is reached for
//! shell commands. The binary exposes the same operations for inspecting a
//! settings file from the command line.

pub mod cli;
pub mod config;
pub mod error;
pub mod system;
pub mod topology;

use anyhow::{Context as _, Result};
use cli::{Args, Command, SettingsCommand};
use config::{Role, Settings, SettingsLocator};
use std::io::Write;
use std::path::PathBuf;
use system::System;
use topology::Topology;

/// Main entry point for the smash-config library
///
/// # Errors
///
/// Returns an error if the requested command fails; settings and topology
/// failures carry a [`error::ConfigError`] for exit-code mapping
pub fn run(args: &Args, system: &dyn System, out: &mut dyn Write) -> Result<()> {
    let locator = SettingsLocator::new(system);
    match args.command {
        Command::Settings(command) => run_settings(command, args, &locator, out)?,
        Command::Hosts { role } => run_hosts(role, args, &locator, system, out)?,
    }
    out.flush()?;
    Ok(())
}

fn settings_path(args: &Args, locator: &SettingsLocator<'_>) -> Result<PathBuf> {
    match args.config {
        Some(ref path) => Ok(path.clone()),
        None => Ok(locator.load_path()?),
    }
}

fn load_settings(args: &Args, locator: &SettingsLocator<'_>) -> Result<Settings> {
    let path = settings_path(args, locator)?;
    Ok(locator.load_from(&path)?)
}

fn run_settings(
    command: SettingsCommand,
    args: &Args,
    locator: &SettingsLocator<'_>,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        SettingsCommand::LoadPath => {
            let path = settings_path(args, locator)?;
            writeln!(out, "{}", path.display())?;
        }
        SettingsCommand::SavePath => {
            let path = match args.config {
                Some(ref path) => path.clone(),
                None => locator.save_path()?,
            };
            writeln!(out, "{}", path.display())?;
        }
        SettingsCommand::Show => {
            let path = settings_path(args, locator)?;
            let document = locator.read_document(&path)?;
            let pretty = serde_json::to_string_pretty(&document)
                .context("Failed to render settings as JSON")?;
            writeln!(out, "{pretty}")?;
        }
        SettingsCommand::Validate => {
            let path = settings_path(args, locator)?;
            let settings = locator.load_from(&path)?;
            Topology::resolve(settings)?;
            writeln!(out, "{} is valid", path.display())?;
        }
    }
    Ok(())
}

fn run_hosts(
    role: Option<Role>,
    args: &Args,
    locator: &SettingsLocator<'_>,
    system: &dyn System,
    out: &mut dyn Write,
) -> Result<()> {
    let topology = Topology::resolve(load_settings(args, locator)?)?;
    let current_hostname = system
        .hostname()
        .context("Failed to determine this machine's hostname")?;

    let hosts = match role {
        Some(role) => topology.hosts_with_role(role),
        None => topology.hosts().iter().collect(),
    };

    for host in hosts {
        let roles: Vec<&str> = topology
            .roles_of(&host.hostname)
            .unwrap_or_default()
            .iter()
            .map(Role::as_str)
            .collect();
        writeln!(
            out,
            "{}\t{}\t{}",
            host.hostname,
            topology.transport(host, &current_hostname),
            roles.join(", ")
        )?;
    }
    Ok(())
}
