use clap::Parser;

#[derive(Parser, Debug)]
#[clap(about, version)]
pub struct Flags {
    /// Run startup validation only (permission checks and one reachability
    /// probe per configured target) and exit with code 0 on success.
    #[clap(long)]
    pub test_config: bool,
}
