use clap::Parser;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Demo API instrumented with Prometheus metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The address to listen on for web requests
    #[arg(long = "web.listen-addr", default_value = ":8080")]
    pub listen_addr: String,

    /// [development] Seed the simulated work durations and outcomes for
    /// reproducible runs (random when unset)
    #[arg(long = "simulation.seed")]
    pub seed: Option<u64>,
}

impl Args {
    /// Candidate addresses for `server::bind`, in order of preference.
    pub fn bind_addrs(&self) -> Vec<String> {
        listen_addrs(&self.listen_addr)
    }
}

/// A host-less address such as `:8080` means every interface: the IPv6
/// wildcard first (dual-stack where the OS allows it), then IPv4 for hosts
/// without IPv6.
pub fn listen_addrs(addr: &str) -> Vec<String> {
    if addr.starts_with(':') {
        vec![format!("[::]{addr}"), format!("0.0.0.0{addr}")]
    } else {
        vec![addr.to_owned()]
    }
}
