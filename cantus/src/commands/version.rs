/// Get the version string for cantus and libcantus
pub fn get_version_string() -> String {
    format!(
        "cantus {}\nlibcantus {}",
        env!("CARGO_PKG_VERSION"),
        libcantus::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
