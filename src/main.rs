fn main() {
    #[cfg(feature = "cli")]
    ctf_format::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("ctf: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
