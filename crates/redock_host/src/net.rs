//! Addresses of the local network interfaces.
//!
//! Containers publish their SSH port on the host, so we need an address
//! that is reachable from outside: loopback and IPv6 addresses are skipped.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};

use crate::error::Result;

/// IPv4, non-loopback addresses bound to local interfaces.
#[cfg(unix)]
pub fn local_ipv4_addresses() -> Result<BTreeSet<Ipv4Addr>> {
    use nix::ifaddrs::getifaddrs;
    use std::net::SocketAddrV4;

    use crate::error::HostError;

    let interfaces = getifaddrs().map_err(|errno| HostError::Interfaces(errno.into()))?;
    let addresses = interfaces.filter_map(|ifaddr| {
        let storage = ifaddr.address?;
        let sin = storage.as_sockaddr_in()?;
        Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()))
    });
    let found = host_addresses(addresses);
    tracing::debug!(count = found.len(), "Found local IPv4 addresses");
    Ok(found)
}

#[cfg(not(unix))]
pub fn local_ipv4_addresses() -> Result<BTreeSet<Ipv4Addr>> {
    Err(crate::error::HostError::Interfaces(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "interface enumeration is only implemented on unix",
    )))
}

/// Keep the IPv4 addresses that are not loopback or unspecified.
pub fn host_addresses<I>(addresses: I) -> BTreeSet<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addresses
        .into_iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
            _ => None,
        })
        .collect()
}
