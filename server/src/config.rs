use serde::Deserialize;
use std::net::{AddrParseError, IpAddr, SocketAddr};

#[derive(Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.ip.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
