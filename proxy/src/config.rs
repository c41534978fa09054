use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use secrecy::SecretString;

pub const DEFAULT_NASA_API_BASE: &str = "https://api.nasa.gov";
pub const DEFAULT_EPIC_API_BASE: &str = "https://epic.gsfc.nasa.gov";

#[derive(Parser)]
#[command(author, version, about = "Forwards NASA imagery requests with a server-side API key")]
pub struct Args {
    /// api.nasa.gov key; never sent to the browser.
    #[arg(long, env = "NASA_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Front-end assets served for every path the API does not claim.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    #[arg(long, env = "NASA_API_BASE", default_value = DEFAULT_NASA_API_BASE)]
    pub nasa_api_base: String,

    #[arg(long, env = "EPIC_API_BASE", default_value = DEFAULT_EPIC_API_BASE)]
    pub epic_api_base: String,
}

pub struct ProxyConfig {
    pub api_key: SecretString,
    pub bind_addr: SocketAddr,
    pub public_dir: PathBuf,
    pub nasa_api_base: String,
    pub epic_api_base: String,
}

impl From<Args> for ProxyConfig {
    fn from(args: Args) -> Self {
        Self {
            api_key: SecretString::new(args.api_key),
            bind_addr: args.bind_addr,
            public_dir: args.public_dir,
            nasa_api_base: args.nasa_api_base.trim_end_matches('/').to_string(),
            epic_api_base: args.epic_api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_apply_when_only_key_given() {
        let args = Args::try_parse_from(["beyond_proxy", "--api-key", "DEMO_KEY"]).unwrap();
        let config = ProxyConfig::from(args);
        assert_eq!(config.api_key.expose_secret(), "DEMO_KEY");
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.nasa_api_base, DEFAULT_NASA_API_BASE);
    }

    #[test]
    fn trailing_slashes_are_dropped_from_bases() {
        let args = Args::try_parse_from([
            "beyond_proxy",
            "--api-key",
            "k",
            "--nasa-api-base",
            "http://127.0.0.1:9000/",
        ])
        .unwrap();
        assert_eq!(ProxyConfig::from(args).nasa_api_base, "http://127.0.0.1:9000");
    }
}
