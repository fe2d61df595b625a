//! Host commands: keys, mirror, addresses, attach.

use std::io::BufRead;

use anyhow::{Context, Result};
use redock_host::{
    local_ipv4_addresses, summarize_id, KeyPairStatus, KeyProvisioner, MirrorSelector,
    RemoteTerminal,
};
use tracing::info;

/// Make sure the SSH key pair exists and print the public key.
pub fn keys() -> Result<()> {
    redock_config::ensure_redock_home().context("Failed to create the configuration directory")?;
    let keys = KeyProvisioner::from_config();
    if keys.ensure_key_pair()? == KeyPairStatus::Generated {
        info!(path = %keys.private_key().display(), "Generated SSH key pair");
    }
    println!("{}", keys.public_key()?);
    Ok(())
}

/// Print the (cached) Ubuntu mirror.
pub fn mirror() -> Result<()> {
    redock_config::ensure_redock_home().context("Failed to create the configuration directory")?;
    println!("{}", MirrorSelector::from_config().select()?);
    Ok(())
}

/// Print the addresses containers can be reached on.
pub fn addresses() -> Result<()> {
    for address in local_ipv4_addresses()? {
        println!("{}", address);
    }
    Ok(())
}

/// Show a container's terminal on stderr until Enter is pressed.
pub fn attach(container_id: &str) -> Result<()> {
    let attached = RemoteTerminal::new(container_id).attach()?;
    eprintln!(
        "Attached to {}; press Enter to detach.",
        summarize_id(container_id)
    );

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    let status = attached.detach()?;
    info!(container = summarize_id(container_id), %status, "Detached");
    Ok(())
}
